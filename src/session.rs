//! Session Module
//!
//! A [`Session`] is a handle on one frontend session, reached through the
//! backend's scripting interface. It owns the generic action dispatcher and
//! wraps it in validated operations on the session as a whole. Per-image
//! operations live on [`crate::Image`].
//!
//! ```no_run
//! # async fn demo() -> carta_scripting::CartaResult<()> {
//! use carta_scripting::{Colormap, Session};
//!
//! let session = Session::connect("localhost", 50051, 1);
//! for image in session.image_list().await? {
//!     image.close().await?;
//! }
//! let image = session.open_image("/data/m87.fits", None).await?;
//! image.set_colormap(Colormap::Viridis, false).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::args;
use crate::constants::{BeamType, ConstantSet, CoordinateSystem, LabelType, Overlay, PaletteColor};
use crate::error::{CartaError, CartaResult};
use crate::image::Image;
use crate::protocol::{encode_arguments, split_path, ActionRequest, Arg, CallOptions, Macro};
use crate::transport::{ActionTransport, GrpcTransport};
use crate::utils::truncate::for_log;
use crate::validation::{
    lowercase, Arguments, Boolean, Color, Constant, NoAttributes, NoneOr, Number, OneOf, Signature, StringParam,
};

lazy_static! {
    static ref OPEN_IMAGE: Signature = Signature::new("open_image")
        .param("path", StringParam::any())
        .param("hdu", StringParam::matching(r"\d+").unwrap());
    static ref SET_VIEW_AREA: Signature = Signature::new("set_view_area")
        .param("width", Number::any())
        .param("height", Number::any());
    static ref SET_COORDINATE_SYSTEM: Signature =
        Signature::new("set_coordinate_system").param("system", Constant::of::<CoordinateSystem>());
    static ref SET_LABEL_TYPE: Signature =
        Signature::new("set_label_type").param("label_type", Constant::of::<LabelType>());
    static ref SET_TEXT: Signature = Signature::new("set_text")
        .param("title", NoneOr::new(StringParam::any()))
        .param("label_x", NoneOr::new(StringParam::any()))
        .param("label_y", NoneOr::new(StringParam::any()));
    static ref SET_FONT: Signature = Signature::new("set_font")
        .param(
            "component",
            OneOf::new([Overlay::Title, Overlay::Numbers, Overlay::Labels]).normalized(lowercase),
        )
        .param("font", NoneOr::new(StringParam::any()))
        .param("font_size", NoneOr::new(Number::any()));
    static ref SET_BEAM: Signature = Signature::new("set_beam")
        .param("beam_type", NoneOr::new(Constant::of::<BeamType>()))
        .param("width", NoneOr::new(Number::any()))
        .param("shift_x", NoneOr::new(Number::any()))
        .param("shift_y", NoneOr::new(Number::any()));
    static ref SET_COLOR: Signature = Signature::new("set_color")
        .param("color", Constant::of::<PaletteColor>())
        .param("component", Constant::of::<Overlay>());
    static ref CLEAR_COLOR: Signature =
        Signature::new("clear_color").param("component", Constant::of::<Overlay>());
    static ref SET_VISIBLE: Signature = Signature::new("set_visible")
        .param("component", Constant::of::<Overlay>())
        .param("visible", Boolean);
    static ref SET_CURSOR: Signature = Signature::new("set_cursor")
        .param("x", Number::any())
        .param("y", Number::any());
    static ref RENDERED_VIEW: Signature =
        Signature::new("rendered_view_url").param("background_color", NoneOr::new(Color::new()));
    static ref SAVE_RENDERED_VIEW: Signature = Signature::new("save_rendered_view")
        .param("file_name", StringParam::any())
        .param("background_color", NoneOr::new(Color::new()));
}

/// Something that hosts the frontend for a session, e.g. a headless browser.
///
/// The session closes it when an action fails and when the last clone of the
/// session is dropped. `close` may be called more than once.
pub trait Browser: Send + Sync {
    fn close(&self);
}

struct SessionInner {
    transport: Arc<dyn ActionTransport>,
    uri: String,
    session_id: u32,
    browser: Option<Box<dyn Browser>>,
    closed: AtomicBool,
}

impl SessionInner {
    fn close(&self) {
        if let Some(browser) = &self.browser {
            if !self.closed.swap(true, Ordering::SeqCst) {
                debug!("Closing browser for session {}", self.session_id);
                browser.close();
            }
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.close();
    }
}

/// A frontend session. Clones share the same connection details and browser.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(transport: Arc<dyn ActionTransport>, session_id: u32, browser: Option<Box<dyn Browser>>) -> Self {
        let uri = transport.endpoint();
        Self {
            inner: Arc::new(SessionInner {
                transport,
                uri,
                session_id,
                browser,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Connect to an existing frontend session through the backend at `host:port`.
    pub fn connect(host: &str, port: u16, session_id: u32) -> Self {
        let transport = GrpcTransport::new(format!("{}:{}", host, port));
        Self::new(Arc::new(transport), session_id, None)
    }

    pub fn with_transport(transport: Arc<dyn ActionTransport>, session_id: u32) -> Self {
        Self::new(transport, session_id, None)
    }

    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    pub fn session_id(&self) -> u32 {
        self.inner.session_id
    }

    // --- Dispatch ---

    /// Call an action on the frontend.
    ///
    /// `path` is the full dotted path to the action; the last segment is the
    /// action name. Arguments may contain [`Macro`]s, which the frontend
    /// evaluates when the action runs. This is the escape hatch for
    /// functionality without a dedicated wrapper.
    pub async fn call_action(&self, path: &str, args: Vec<Arg>) -> CartaResult<Option<Value>> {
        self.call_action_with(path, args, CallOptions::default()).await
    }

    /// [`Session::call_action`] with explicit [`CallOptions`].
    ///
    /// Returns `Ok(None)` when the frontend sent no response and none was
    /// expected. Any failure closes the session's browser.
    pub async fn call_action_with(&self, path: &str, args: Vec<Arg>, options: CallOptions) -> CartaResult<Option<Value>> {
        let (object_path, action) = split_path(path);
        let parameters = encode_arguments(&args)?;

        debug!(
            "Sending action request to backend; path: {}; action: {}; parameters: {}; async: {}",
            object_path, action, parameters, options.r#async
        );

        let description = format!(
            "CARTA scripting action {}.{} called with parameters {}",
            object_path, action, parameters
        );

        let request = ActionRequest {
            session_id: self.inner.session_id,
            path: object_path.to_string(),
            action: action.to_string(),
            parameters,
            is_async: options.r#async,
        };

        let reply = match self.inner.transport.call_action(request).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(CartaError::transport(&description, &e))),
        };

        debug!(
            "Got success status: {}; message: {}; response: {}",
            reply.success,
            reply.message,
            for_log(&reply.response)
        );

        if !reply.success {
            return Err(self.fail(CartaError::ActionFailed(format!(
                "{} failed: {}",
                description, reply.message
            ))));
        }

        if reply.response.is_empty() {
            if options.response_expected {
                return Err(self.fail(CartaError::BadResponse(format!(
                    "{} expected a response, but did not receive one.",
                    description
                ))));
            }
            return Ok(None);
        }

        match serde_json::from_str(&reply.response) {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(self.fail(CartaError::BadResponse(format!(
                "{} received a response which could not be decoded.\nResponse string: {}\nError: {}",
                description, reply.response, e
            )))),
        }
    }

    fn fail(&self, err: CartaError) -> CartaError {
        self.close();
        err
    }

    /// Read an attribute of a frontend store. `path` is the full dotted path.
    pub async fn get_value(&self, path: &str) -> CartaResult<Value> {
        let (store, attribute) = split_path(path);
        let macro_ = Macro::new(store, attribute);
        self.call_action_with("fetchParameter", args![macro_], CallOptions::expect_response())
            .await?
            .ok_or_else(|| CartaError::BadResponse(format!("No value was returned for {}.", path)))
    }

    /// [`Session::get_value`], deserialized into `T`.
    pub async fn get_value_as<T: DeserializeOwned>(&self, path: &str) -> CartaResult<T> {
        let value = self.get_value(path).await?;
        serde_json::from_value(value.clone()).map_err(|e| {
            CartaError::BadResponse(format!(
                "Value of {} has an unexpected shape: {} ({})",
                path,
                for_log(&value.to_string()),
                e
            ))
        })
    }

    // --- File browsing ---

    /// Make `path` absolute. Relative paths are resolved against [`Session::pwd`].
    pub async fn resolve_file_path(&self, path: &str) -> CartaResult<String> {
        if path.starts_with('/') {
            return Ok(path.to_string());
        }
        let pwd = self.pwd().await?;
        Ok(format!("{}/{}", pwd.trim_end_matches('/'), path))
    }

    /// The current directory, relative to the backend's root.
    pub async fn pwd(&self) -> CartaResult<String> {
        self.refresh_file_list().await?;
        let directory: String = self.get_value_as("fileBrowserStore.fileList.directory").await?;
        Ok(format!("/{}", directory.trim_start_matches('/')))
    }

    /// Files and subdirectories (with a trailing `/`) of the current directory, sorted.
    pub async fn ls(&self) -> CartaResult<Vec<String>> {
        self.refresh_file_list().await?;
        let file_list = self.get_value("fileBrowserStore.fileList").await?;

        let mut items: Vec<String> = Vec::new();
        if let Some(files) = file_list.get("files").and_then(Value::as_array) {
            items.extend(files.iter().filter_map(|f| f.get("name")?.as_str().map(str::to_string)));
        }
        if let Some(dirs) = file_list.get("subdirectories").and_then(Value::as_array) {
            items.extend(dirs.iter().filter_map(|d| d.as_str().map(|d| format!("{}/", d))));
        }
        items.sort();
        Ok(items)
    }

    /// Change the current directory.
    ///
    /// `..` is not supported. The frontend accepts a directory that does not
    /// exist and then fails to list it, so the change is verified and rolled
    /// back with a warning if it did not take.
    pub async fn cd(&self, path: &str) -> CartaResult<()> {
        let full_path = self.resolve_file_path(path).await?;
        self.call_action("fileBrowserStore.saveStartingDirectory", args![&full_path])
            .await?;

        let pwd = self.pwd().await?;
        if pwd.trim_end_matches('/') != full_path.trim_end_matches('/') {
            self.call_action("fileBrowserStore.saveStartingDirectory", args![&pwd])
                .await?;
            warn!("Could not change directory to {}.", full_path);
        }
        Ok(())
    }

    async fn refresh_file_list(&self) -> CartaResult<()> {
        let starting = Macro::new("fileBrowserStore", "startingDirectory");
        self.call_action("fileBrowserStore.getFileList", args![starting]).await?;
        Ok(())
    }

    // --- Images ---

    /// Open an image, replacing any open images.
    ///
    /// `hdu` is a string of digits selecting the HDU; the default is the first.
    pub async fn open_image(&self, path: &str, hdu: Option<&str>) -> CartaResult<Image> {
        self.load_image(path, hdu, false).await
    }

    /// Open an image, keeping the open images.
    pub async fn append_image(&self, path: &str, hdu: Option<&str>) -> CartaResult<Image> {
        self.load_image(path, hdu, true).await
    }

    async fn load_image(&self, path: &str, hdu: Option<&str>, append: bool) -> CartaResult<Image> {
        let mut args = Arguments::new().arg(path);
        if let Some(hdu) = hdu {
            args = args.arg(hdu);
        }
        OPEN_IMAGE.validate(&args, &NoAttributes).await?;
        Image::new(self, path, hdu.unwrap_or(""), append).await
    }

    /// Handles for every open image.
    pub async fn image_list(&self) -> CartaResult<Vec<Image>> {
        let frames = self.get_value("frameNames").await?;
        Image::from_list(self, &frames)
    }

    pub async fn active_frame(&self) -> CartaResult<Image> {
        let frame_info = self.get_value("activeFrame.frameInfo").await?;
        let image_id = frame_info.get("fileId").and_then(Value::as_i64);
        let file_name = frame_info
            .get("fileInfo")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str);

        match (image_id, file_name) {
            (Some(id), Some(name)) => Ok(Image::from_parts(self.clone(), id, name)),
            _ => Err(CartaError::BadResponse(format!(
                "Active frame info has no file id or name: {}",
                for_log(&frame_info.to_string())
            ))),
        }
    }

    pub async fn clear_spatial_reference(&self) -> CartaResult<()> {
        self.call_action("clearSpatialReference", args![]).await?;
        Ok(())
    }

    pub async fn clear_spectral_reference(&self) -> CartaResult<()> {
        self.call_action("clearSpectralReference", args![]).await?;
        Ok(())
    }

    // --- Canvas and overlay ---

    /// Set the view area, in pixels divided by the browser's pixel ratio.
    pub async fn set_view_area(&self, width: f64, height: f64) -> CartaResult<()> {
        let args = Arguments::new().arg(width).arg(height);
        SET_VIEW_AREA.validate(&args, &NoAttributes).await?;
        self.call_action("overlayStore.setViewDimension", args![width, height])
            .await?;
        Ok(())
    }

    pub async fn set_coordinate_system(&self, system: impl Into<Value>) -> CartaResult<()> {
        let system = system.into();
        SET_COORDINATE_SYSTEM
            .validate(&Arguments::new().arg(system.clone()), &NoAttributes)
            .await?;
        self.call_action("overlayStore.global.setSystem", args![system]).await?;
        Ok(())
    }

    pub async fn set_label_type(&self, label_type: impl Into<Value>) -> CartaResult<()> {
        let label_type = label_type.into();
        SET_LABEL_TYPE
            .validate(&Arguments::new().arg(label_type.clone()), &NoAttributes)
            .await?;
        self.call_action("overlayStore.global.setLabelType", args![label_type])
            .await?;
        Ok(())
    }

    /// Set a custom title and/or axis labels. `None` leaves that text alone.
    pub async fn set_text(&self, title: Option<&str>, label_x: Option<&str>, label_y: Option<&str>) -> CartaResult<()> {
        let args = Arguments::new().arg(title).arg(label_x).arg(label_y);
        SET_TEXT.validate(&args, &NoAttributes).await?;

        if let Some(title) = title {
            self.call_action("overlayStore.title.setCustomTitleString", args![title])
                .await?;
            self.call_action("overlayStore.title.setCustomText", args![true])
                .await?;
        }
        if let Some(label_x) = label_x {
            self.call_action("overlayStore.labels.setCustomLabelX", args![label_x])
                .await?;
        }
        if let Some(label_y) = label_y {
            self.call_action("overlayStore.labels.setCustomLabelY", args![label_y])
                .await?;
        }
        if label_x.is_some() || label_y.is_some() {
            self.call_action("overlayStore.labels.setCustomText", args![true])
                .await?;
        }
        Ok(())
    }

    pub async fn clear_text(&self) -> CartaResult<()> {
        self.call_action("overlayStore.title.setCustomText", args![false])
            .await?;
        self.call_action("overlayStore.labels.setCustomText", args![false])
            .await?;
        Ok(())
    }

    /// Set the font and/or size of the title, numbers or labels.
    pub async fn set_font(&self, component: impl Into<Value>, font: Option<&str>, font_size: Option<f64>) -> CartaResult<()> {
        let component = component.into();
        let args = Arguments::new().arg(component.clone()).arg(font).arg(font_size);
        SET_FONT.validate(&args, &NoAttributes).await?;

        let store = store_name(&component).to_lowercase();
        if let Some(font) = font {
            self.call_action(&format!("overlayStore.{}.setFont", store), args![font])
                .await?;
        }
        if let Some(size) = font_size {
            self.call_action(&format!("overlayStore.{}.setFontSize", store), args![size])
                .await?;
        }
        Ok(())
    }

    pub async fn set_beam(
        &self,
        beam_type: Option<BeamType>,
        width: Option<f64>,
        shift_x: Option<f64>,
        shift_y: Option<f64>,
    ) -> CartaResult<()> {
        let args = Arguments::new()
            .arg(beam_type.map(Value::from))
            .arg(width)
            .arg(shift_x)
            .arg(shift_y);
        SET_BEAM.validate(&args, &NoAttributes).await?;

        let beam = Overlay::Beam.store();
        if let Some(beam_type) = beam_type {
            self.call_action(&format!("overlayStore.{}.setBeamType", beam), args![beam_type])
                .await?;
        }
        if let Some(width) = width {
            self.call_action(&format!("overlayStore.{}.setWidth", beam), args![width])
                .await?;
        }
        if let Some(shift_x) = shift_x {
            self.call_action(&format!("overlayStore.{}.setShiftX", beam), args![shift_x])
                .await?;
        }
        if let Some(shift_y) = shift_y {
            self.call_action(&format!("overlayStore.{}.setShiftY", beam), args![shift_y])
                .await?;
        }
        Ok(())
    }

    /// Set the colour of an overlay component, or the global colour with [`Overlay::Global`].
    pub async fn set_color(&self, color: impl Into<Value>, component: impl Into<Value>) -> CartaResult<()> {
        let (color, component) = (color.into(), component.into());
        let args = Arguments::new().arg(color.clone()).arg(component.clone());
        SET_COLOR.validate(&args, &NoAttributes).await?;

        let store = store_name(&component);
        self.call_action(&format!("overlayStore.{}.setColor", store), args![color])
            .await?;
        if !is_overlay(&component, Overlay::Global) && !is_overlay(&component, Overlay::Beam) {
            self.call_action(&format!("overlayStore.{}.setCustomColor", store), args![true])
                .await?;
        }
        Ok(())
    }

    pub async fn clear_color(&self, component: impl Into<Value>) -> CartaResult<()> {
        let component = component.into();
        CLEAR_COLOR
            .validate(&Arguments::new().arg(component.clone()), &NoAttributes)
            .await?;

        if !is_overlay(&component, Overlay::Global) {
            let store = store_name(&component);
            self.call_action(&format!("overlayStore.{}.setCustomColor", store), args![false])
                .await?;
        }
        Ok(())
    }

    /// Show or hide an overlay component. Ticks cannot be toggled on their own.
    pub async fn set_visible(&self, component: impl Into<Value>, visible: bool) -> CartaResult<()> {
        let component = component.into();
        let args = Arguments::new().arg(component.clone()).arg(visible);
        SET_VISIBLE.validate(&args, &NoAttributes).await?;

        if is_overlay(&component, Overlay::Ticks) {
            warn!("Ticks cannot be shown or hidden.");
            return Ok(());
        }
        if !is_overlay(&component, Overlay::Global) {
            let store = store_name(&component);
            self.call_action(&format!("overlayStore.{}.setVisible", store), args![visible])
                .await?;
        }
        Ok(())
    }

    pub async fn show(&self, component: impl Into<Value>) -> CartaResult<()> {
        self.set_visible(component, true).await
    }

    pub async fn hide(&self, component: impl Into<Value>) -> CartaResult<()> {
        self.set_visible(component, false).await
    }

    pub async fn toggle_labels(&self) -> CartaResult<()> {
        self.call_action("overlayStore.toggleLabels", args![]).await?;
        Ok(())
    }

    // --- Cursor ---

    /// Move the cursor on the active image.
    pub async fn set_cursor(&self, x: f64, y: f64) -> CartaResult<()> {
        SET_CURSOR
            .validate(&Arguments::new().arg(x).arg(y), &NoAttributes)
            .await?;
        let frame = self.active_frame().await?;
        frame
            .call_action("regionSet.regions[0].setControlPoint", args![0, vec![x, y]])
            .await?;
        Ok(())
    }

    // --- Rendered view ---

    /// A PNG data URL of the rendered active image. The background is
    /// transparent unless `background_color` is given.
    pub async fn rendered_view_url(&self, background_color: Option<&str>) -> CartaResult<String> {
        RENDERED_VIEW
            .validate(&Arguments::new().arg(background_color), &NoAttributes)
            .await?;

        self.call_action("waitForImageData", args![]).await?;
        let args = match background_color {
            Some(color) => args![color],
            None => args![],
        };
        let url = self
            .call_action_with("getImageDataUrl", args, CallOptions::expect_response())
            .await?;

        match url {
            Some(Value::String(url)) => Ok(url),
            other => Err(CartaError::BadResponse(format!(
                "Expected an image data URL but got {}",
                for_log(&other.unwrap_or(Value::Null).to_string())
            ))),
        }
    }

    /// Decoded PNG bytes of the rendered active image.
    pub async fn rendered_view_data(&self, background_color: Option<&str>) -> CartaResult<Vec<u8>> {
        let url = self.rendered_view_url(background_color).await?;
        let data = url.split(',').nth(1).ok_or_else(|| {
            CartaError::BadResponse(format!("Not a data URL: {}", for_log(&url)))
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| CartaError::BadResponse(format!("Image data is not valid base64: {}", e)))
    }

    /// Write the rendered active image to a PNG file.
    pub async fn save_rendered_view(&self, file_name: impl AsRef<Path>, background_color: Option<&str>) -> CartaResult<()> {
        let file_name = file_name.as_ref();
        let args = Arguments::new()
            .arg(file_name.to_string_lossy().into_owned())
            .arg(background_color);
        SAVE_RENDERED_VIEW.validate(&args, &NoAttributes).await?;

        let data = self.rendered_view_data(background_color).await?;
        tokio::fs::write(file_name, data).await?;
        debug!("Saved rendered view to {}", file_name.display());
        Ok(())
    }

    /// Close the browser hosting this session, if there is one.
    ///
    /// Sessions attached to an external frontend have nothing to close.
    pub fn close(&self) {
        self.inner.close();
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session(session_id={}, uri={})", self.inner.session_id, self.inner.uri)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field("uri", &self.inner.uri)
            .field("has_browser", &self.inner.browser.is_some())
            .finish()
    }
}

/// Overlay store name for a validated component value.
fn store_name(component: &Value) -> String {
    match component {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_overlay(component: &Value, overlay: Overlay) -> bool {
    *component == overlay.value()
}
