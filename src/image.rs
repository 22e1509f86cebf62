//! Image Module
//!
//! An [`Image`] is a handle on one image open in a frontend session. Every
//! action it sends is addressed to its own frame store, `frameMap[<id>]`.
//!
//! Handles are made by [`Session::open_image`], [`Session::append_image`],
//! [`Session::image_list`] and [`Session::active_frame`], never directly.

use std::fmt;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::args;
use crate::constants::{Colormap, ContourDashMode, ConstantSet, Scaling, SmoothingMode};
use crate::error::{CartaError, CartaResult};
use crate::protocol::{Arg, CallOptions, Macro};
use crate::session::Session;
use crate::utils::truncate::for_log;
use crate::validation::{
    Arguments, AttributeSource, Boolean, Color, Constant, EvalArg, Evaluate, IterableOf, NoneOr, Number, Signature,
};

lazy_static! {
    static ref SET_SPATIAL_MATCHING: Signature = Signature::new("set_spatial_matching").param("state", Boolean);
    static ref SET_SPECTRAL_MATCHING: Signature = Signature::new("set_spectral_matching").param("state", Boolean);
    static ref SET_CHANNEL_STOKES: Signature = Signature::new("set_channel_stokes")
        .param("channel", Evaluate::number(0i64, EvalArg::attr("depth"), true, false))
        .param("stokes", Evaluate::number(0i64, EvalArg::attr("stokes"), true, false))
        .param("recursive", Boolean);
    static ref SET_CENTER: Signature = Signature::new("set_center")
        .param("x", Number::any())
        .param("y", Number::any());
    static ref SET_ZOOM: Signature = Signature::new("set_zoom")
        .param("zoom", Number::any().greater_than(0.0))
        .param("absolute", Boolean);
    static ref SET_COLORMAP: Signature = Signature::new("set_colormap")
        .param("colormap", Constant::of::<Colormap>())
        .param("invert", Boolean);
    static ref SET_SCALING: Signature = Signature::new("set_scaling")
        .param("scaling", Constant::of::<Scaling>())
        .param("alpha", NoneOr::new(Number::any()))
        .param("gamma", NoneOr::new(Number::any()))
        .param("min", NoneOr::new(Number::any()))
        .param("max", NoneOr::new(Number::any()));
    static ref SET_RASTER_VISIBLE: Signature = Signature::new("set_raster_visible").param("state", Boolean);
    static ref CONFIGURE_CONTOURS: Signature = Signature::new("configure_contours")
        .param("levels", IterableOf::new(Number::any()))
        .param("smoothing_mode", Constant::of::<SmoothingMode>())
        .param("smoothing_factor", Number::any());
    static ref SET_CONTOUR_DASH: Signature = Signature::new("set_contour_dash")
        .param("dash_mode", NoneOr::new(Constant::of::<ContourDashMode>()))
        .param("thickness", NoneOr::new(Number::any()));
    static ref SET_CONTOUR_COLOR: Signature = Signature::new("set_contour_color").param("color", Color::new());
    static ref SET_CONTOUR_COLORMAP: Signature = Signature::new("set_contour_colormap")
        .param("colormap", Constant::of::<Colormap>())
        .param("bias", NoneOr::new(Number::any()))
        .param("contrast", NoneOr::new(Number::any()));
    static ref SET_CONTOURS_VISIBLE: Signature = Signature::new("set_contours_visible").param("state", Boolean);
    static ref USE_HISTOGRAM: Signature = Signature::new("use_cube_histogram").param("contours", Boolean);
    static ref SET_PERCENTILE_RANK: Signature =
        Signature::new("set_percentile_rank").param("rank", Number::between(0.0, 100.0));
}

/// Default smoothing for [`Image::configure_contours`].
pub const DEFAULT_SMOOTHING_MODE: SmoothingMode = SmoothingMode::GaussianBlur;
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 4.0;

/// Fetched once per handle.
///
/// These describe the file and cannot change while it is loaded, so the cache
/// is never invalidated.
#[derive(Default)]
struct Metadata {
    directory: OnceCell<String>,
    header: OnceCell<Value>,
    width: OnceCell<i64>,
    height: OnceCell<i64>,
    depth: OnceCell<i64>,
    stokes: OnceCell<i64>,
    ndim: OnceCell<i64>,
}

/// An image open in a frontend session.
pub struct Image {
    session: Session,
    image_id: i64,
    file_name: String,
    base_path: String,
    frame: Macro,
    metadata: Metadata,
}

impl Image {
    pub(crate) fn from_parts(session: Session, image_id: i64, file_name: impl Into<String>) -> Self {
        let base_path = format!("frameMap[{}]", image_id);
        let frame = Macro::new("", base_path.clone());
        Self {
            session,
            image_id,
            file_name: file_name.into(),
            base_path,
            frame,
            metadata: Metadata::default(),
        }
    }

    /// Open or append `path` and return a handle on the new frame.
    ///
    /// The frontend changes its current directory to the image's directory
    /// while loading; the previous directory is restored afterwards.
    pub(crate) async fn new(session: &Session, path: &str, hdu: &str, append: bool) -> CartaResult<Self> {
        let path = session.resolve_file_path(path).await?;
        let (directory, file_name) = split_file_path(&path);
        let saved_pwd = session.pwd().await?;

        let action = if append { "appendFile" } else { "openFile" };
        let reply = session.call_action(action, args![directory, file_name, hdu]).await?;
        session.cd(&saved_pwd).await?;

        let image_id = reply.as_ref().and_then(Value::as_i64).ok_or_else(|| {
            CartaError::BadResponse(format!(
                "{} for {} did not return an image id; got {}",
                action,
                path,
                for_log(&reply.clone().unwrap_or(Value::Null).to_string())
            ))
        })?;
        debug!("Loaded {} as image {}", path, image_id);

        Ok(Self::from_parts(session.clone(), image_id, file_name))
    }

    /// Handles for the entries of the frontend's `frameNames` list.
    ///
    /// Each entry is `{"label": "<index>: <file name>", "value": <image id>}`.
    pub(crate) fn from_list(session: &Session, frames: &Value) -> CartaResult<Vec<Self>> {
        let entries = frames.as_array().ok_or_else(|| {
            CartaError::BadResponse(format!("Frame list is not a list: {}", for_log(&frames.to_string())))
        })?;

        entries
            .iter()
            .map(|entry| {
                let image_id = entry.get("value").and_then(Value::as_i64);
                let file_name = entry
                    .get("label")
                    .and_then(Value::as_str)
                    .and_then(|label| label.split_once(':'))
                    .map(|(_, name)| name.trim());
                match (image_id, file_name) {
                    (Some(id), Some(name)) => Ok(Self::from_parts(session.clone(), id, name)),
                    _ => Err(CartaError::BadResponse(format!("Unexpected frame list entry: {}", entry))),
                }
            })
            .collect()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Unique within the session and never reused; not the index in the image list.
    pub fn image_id(&self) -> i64 {
        self.image_id
    }

    /// File name without the directory.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// [`Session::call_action`] with `path` relative to this image's frame store.
    pub async fn call_action(&self, path: &str, args: Vec<Arg>) -> CartaResult<Option<Value>> {
        self.call_action_with(path, args, CallOptions::default()).await
    }

    /// [`Session::call_action_with`] with `path` relative to this image's frame store.
    pub async fn call_action_with(&self, path: &str, args: Vec<Arg>, options: CallOptions) -> CartaResult<Option<Value>> {
        self.session
            .call_action_with(&format!("{}.{}", self.base_path, path), args, options)
            .await
    }

    /// [`Session::get_value`] with `path` relative to this image's frame store.
    pub async fn get_value(&self, path: &str) -> CartaResult<Value> {
        self.session.get_value(&format!("{}.{}", self.base_path, path)).await
    }

    pub async fn get_value_as<T: DeserializeOwned>(&self, path: &str) -> CartaResult<T> {
        self.session
            .get_value_as(&format!("{}.{}", self.base_path, path))
            .await
    }

    async fn cached<T>(&self, cell: &OnceCell<T>, path: &str) -> CartaResult<T>
    where
        T: DeserializeOwned + Clone,
    {
        cell.get_or_try_init(|| self.get_value_as::<T>(path)).await.cloned()
    }

    // --- Metadata ---

    /// Directory containing the image.
    pub async fn directory(&self) -> CartaResult<String> {
        self.cached(&self.metadata.directory, "frameInfo.directory").await
    }

    /// Header entries, as sent by the frontend.
    pub async fn header(&self) -> CartaResult<Value> {
        self.cached(&self.metadata.header, "frameInfo.fileInfoExtended.headerEntries")
            .await
    }

    pub async fn width(&self) -> CartaResult<i64> {
        self.cached(&self.metadata.width, "frameInfo.fileInfoExtended.width").await
    }

    pub async fn height(&self) -> CartaResult<i64> {
        self.cached(&self.metadata.height, "frameInfo.fileInfoExtended.height").await
    }

    /// Number of channels.
    pub async fn depth(&self) -> CartaResult<i64> {
        self.cached(&self.metadata.depth, "frameInfo.fileInfoExtended.depth").await
    }

    /// Number of Stokes parameters.
    pub async fn stokes(&self) -> CartaResult<i64> {
        self.cached(&self.metadata.stokes, "frameInfo.fileInfoExtended.stokes").await
    }

    pub async fn ndim(&self) -> CartaResult<i64> {
        self.cached(&self.metadata.ndim, "frameInfo.fileInfoExtended.dimensions")
            .await
    }

    /// Axis lengths, slowest-varying first: `[stokes, depth, height, width][4 - ndim..]`.
    pub async fn shape(&self) -> CartaResult<Vec<i64>> {
        let ndim = self.ndim().await?.clamp(0, 4) as usize;
        let mut shape = Vec::with_capacity(ndim);
        for axis in 0..ndim {
            let length = match axis {
                0 => self.width().await?,
                1 => self.height().await?,
                2 => self.depth().await?,
                _ => self.stokes().await?,
            };
            shape.push(length);
        }
        shape.reverse();
        Ok(shape)
    }

    // --- Selection ---

    pub async fn make_active(&self) -> CartaResult<()> {
        self.session.call_action("setActiveFrame", args![&self.frame]).await?;
        Ok(())
    }

    pub async fn make_spatial_reference(&self) -> CartaResult<()> {
        self.session
            .call_action("setSpatialReference", args![&self.frame])
            .await?;
        Ok(())
    }

    pub async fn set_spatial_matching(&self, state: bool) -> CartaResult<()> {
        SET_SPATIAL_MATCHING
            .validate(&Arguments::new().arg(state), self)
            .await?;
        self.session
            .call_action("setSpatialMatchingEnabled", args![&self.frame, state])
            .await?;
        Ok(())
    }

    pub async fn make_spectral_reference(&self) -> CartaResult<()> {
        self.session
            .call_action("setSpectralReference", args![&self.frame])
            .await?;
        Ok(())
    }

    pub async fn set_spectral_matching(&self, state: bool) -> CartaResult<()> {
        SET_SPECTRAL_MATCHING
            .validate(&Arguments::new().arg(state), self)
            .await?;
        self.session
            .call_action("setSpectralMatchingEnabled", args![&self.frame, state])
            .await?;
        Ok(())
    }

    // --- Navigation ---

    /// Set the channel and/or Stokes.
    ///
    /// `channel` must be below [`Image::depth`] and `stokes` below
    /// [`Image::stokes`]; `None` keeps the current value. With `recursive`
    /// the change is applied to all spectrally matched images too.
    pub async fn set_channel_stokes(&self, channel: Option<i64>, stokes: Option<i64>, recursive: bool) -> CartaResult<()> {
        let mut args = Arguments::new().kwarg("recursive", recursive);
        if let Some(channel) = channel {
            args = args.kwarg("channel", channel);
        }
        if let Some(stokes) = stokes {
            args = args.kwarg("stokes", stokes);
        }
        SET_CHANNEL_STOKES.validate(&args, self).await?;

        let channel = match channel {
            Some(channel) => Value::from(channel),
            None => self.get_value("requiredChannel").await?,
        };
        let stokes = match stokes {
            Some(stokes) => Value::from(stokes),
            None => self.get_value("requiredStokes").await?,
        };
        self.call_action("setChannels", args![channel, stokes, recursive]).await?;
        Ok(())
    }

    /// Centre the view on image coordinates `(x, y)`.
    pub async fn set_center(&self, x: f64, y: f64) -> CartaResult<()> {
        SET_CENTER.validate(&Arguments::new().arg(x).arg(y), self).await?;
        self.call_action("setCenter", args![x, y]).await?;
        Ok(())
    }

    /// Set the zoom level. With `absolute == false` the level is adjusted by
    /// the frontend's zoom scaling factor.
    pub async fn set_zoom(&self, zoom: f64, absolute: bool) -> CartaResult<()> {
        SET_ZOOM
            .validate(&Arguments::new().arg(zoom).arg(absolute), self)
            .await?;
        self.call_action("setZoom", args![zoom, absolute]).await?;
        Ok(())
    }

    // --- Style ---

    pub async fn set_colormap(&self, colormap: impl Into<Value>, invert: bool) -> CartaResult<()> {
        let colormap = colormap.into();
        SET_COLORMAP
            .validate(&Arguments::new().arg(colormap.clone()).arg(invert), self)
            .await?;
        self.call_action("renderConfig.setColorMap", args![colormap]).await?;
        self.call_action("renderConfig.setInverted", args![invert]).await?;
        Ok(())
    }

    /// Set the colormap scaling.
    ///
    /// `alpha` only applies to log and power scaling, `gamma` only to gamma
    /// scaling. `min` and `max` set a custom scale and are ignored unless both
    /// are given.
    pub async fn set_scaling(
        &self,
        scaling: impl Into<Value>,
        alpha: Option<f64>,
        gamma: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> CartaResult<()> {
        let scaling = scaling.into();
        let args = Arguments::new()
            .arg(scaling.clone())
            .arg(alpha)
            .arg(gamma)
            .arg(min)
            .arg(max);
        SET_SCALING.validate(&args, self).await?;

        self.call_action("renderConfig.setScaling", args![scaling.clone()])
            .await?;

        let uses_alpha = scaling == Scaling::Log.value() || scaling == Scaling::Power.value();
        match (alpha, gamma) {
            (Some(alpha), _) if uses_alpha => {
                self.call_action("renderConfig.setAlpha", args![alpha]).await?;
            }
            (_, Some(gamma)) if scaling == Scaling::Gamma.value() => {
                self.call_action("renderConfig.setGamma", args![gamma]).await?;
            }
            _ => {}
        }

        if let (Some(min), Some(max)) = (min, max) {
            self.call_action("renderConfig.setCustomScale", args![min, max])
                .await?;
        }
        Ok(())
    }

    pub async fn set_raster_visible(&self, state: bool) -> CartaResult<()> {
        SET_RASTER_VISIBLE
            .validate(&Arguments::new().arg(state), self)
            .await?;
        self.call_action("renderConfig.setVisible", args![state]).await?;
        Ok(())
    }

    pub async fn show_raster(&self) -> CartaResult<()> {
        self.set_raster_visible(true).await
    }

    pub async fn hide_raster(&self) -> CartaResult<()> {
        self.set_raster_visible(false).await
    }

    // --- Contours ---

    /// Configure contour levels and smoothing.
    ///
    /// `levels` may be a `Vec` of numbers or an `ndarray` array. Typical
    /// smoothing is [`DEFAULT_SMOOTHING_MODE`] with [`DEFAULT_SMOOTHING_FACTOR`].
    pub async fn configure_contours(
        &self,
        levels: impl Into<Arg>,
        smoothing_mode: impl Into<Value>,
        smoothing_factor: f64,
    ) -> CartaResult<()> {
        let levels = levels.into();
        let smoothing_mode = smoothing_mode.into();
        let args = Arguments::new()
            .arg(levels.to_value())
            .arg(smoothing_mode.clone())
            .arg(smoothing_factor);
        CONFIGURE_CONTOURS.validate(&args, self).await?;

        self.call_action(
            "contourConfig.setContourConfiguration",
            vec![levels, Arg::from(smoothing_mode), Arg::from(smoothing_factor)],
        )
        .await?;
        Ok(())
    }

    pub async fn set_contour_dash(&self, dash_mode: Option<ContourDashMode>, thickness: Option<f64>) -> CartaResult<()> {
        let args = Arguments::new().arg(dash_mode.map(Value::from)).arg(thickness);
        SET_CONTOUR_DASH.validate(&args, self).await?;

        if let Some(dash_mode) = dash_mode {
            self.call_action("contourConfig.setDashMode", args![dash_mode]).await?;
        }
        if let Some(thickness) = thickness {
            self.call_action("contourConfig.setThickness", args![thickness]).await?;
        }
        Ok(())
    }

    /// Use a single contour colour. This turns off the contour colormap.
    pub async fn set_contour_color(&self, color: &str) -> CartaResult<()> {
        SET_CONTOUR_COLOR
            .validate(&Arguments::new().arg(color), self)
            .await?;
        self.call_action("contourConfig.setColor", args![color]).await?;
        self.call_action("contourConfig.setColormapEnabled", args![false])
            .await?;
        Ok(())
    }

    /// Colour contours with a colormap. This turns on the contour colormap.
    pub async fn set_contour_colormap(
        &self,
        colormap: impl Into<Value>,
        bias: Option<f64>,
        contrast: Option<f64>,
    ) -> CartaResult<()> {
        let colormap = colormap.into();
        let args = Arguments::new().arg(colormap.clone()).arg(bias).arg(contrast);
        SET_CONTOUR_COLORMAP.validate(&args, self).await?;

        self.call_action("contourConfig.setColormap", args![colormap]).await?;
        self.call_action("contourConfig.setColormapEnabled", args![true])
            .await?;
        if let Some(bias) = bias {
            self.call_action("contourConfig.setColormapBias", args![bias]).await?;
        }
        if let Some(contrast) = contrast {
            self.call_action("contourConfig.setColormapContrast", args![contrast])
                .await?;
        }
        Ok(())
    }

    pub async fn apply_contours(&self) -> CartaResult<()> {
        self.call_action("applyContours", args![]).await?;
        Ok(())
    }

    pub async fn clear_contours(&self) -> CartaResult<()> {
        self.call_action("clearContours", args![true]).await?;
        Ok(())
    }

    pub async fn set_contours_visible(&self, state: bool) -> CartaResult<()> {
        SET_CONTOURS_VISIBLE
            .validate(&Arguments::new().arg(state), self)
            .await?;
        self.call_action("contourConfig.setVisible", args![state]).await?;
        Ok(())
    }

    pub async fn show_contours(&self) -> CartaResult<()> {
        self.set_contours_visible(true).await
    }

    pub async fn hide_contours(&self) -> CartaResult<()> {
        self.set_contours_visible(false).await
    }

    // --- Histogram ---

    /// Scale by the cube histogram, for the contours or (by default) the raster.
    pub async fn use_cube_histogram(&self, contours: bool) -> CartaResult<()> {
        self.set_cube_histogram(contours, true).await
    }

    /// Scale by the per-channel histogram, for the contours or the raster.
    pub async fn use_channel_histogram(&self, contours: bool) -> CartaResult<()> {
        self.set_cube_histogram(contours, false).await
    }

    async fn set_cube_histogram(&self, contours: bool, cube: bool) -> CartaResult<()> {
        USE_HISTOGRAM
            .validate(&Arguments::new().arg(contours), self)
            .await?;
        let action = if contours {
            "renderConfig.setUseCubeHistogramContours"
        } else {
            "renderConfig.setUseCubeHistogram"
        };
        self.call_action(action, args![cube]).await?;
        Ok(())
    }

    pub async fn set_percentile_rank(&self, rank: f64) -> CartaResult<()> {
        SET_PERCENTILE_RANK
            .validate(&Arguments::new().arg(rank), self)
            .await?;
        self.call_action("renderConfig.setPercentileRank", args![rank]).await?;
        Ok(())
    }

    // --- Close ---

    /// Close this image in the frontend. The handle is consumed.
    pub async fn close(self) -> CartaResult<()> {
        self.session.call_action("closeFile", args![&self.frame]).await?;
        Ok(())
    }
}

#[async_trait]
impl AttributeSource for Image {
    async fn attribute(&self, name: &str) -> CartaResult<Option<Value>> {
        let value = match name {
            "width" => self.width().await?,
            "height" => self.height().await?,
            "depth" => self.depth().await?,
            "stokes" => self.stokes().await?,
            "ndim" => self.ndim().await?,
            "image_id" => self.image_id,
            "file_name" => return Ok(Some(Value::from(self.file_name.as_str()))),
            _ => return Ok(None),
        };
        Ok(Some(Value::from(value)))
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.session.session_id(), self.image_id, self.file_name)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("session_id", &self.session.session_id())
            .field("image_id", &self.image_id)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Split a POSIX path into directory and file name. The root stays `/`.
fn split_file_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => {
            let head = &path[..=idx];
            let trimmed = head.trim_end_matches('/');
            let directory = if trimmed.is_empty() { head } else { trimmed };
            (directory, &path[idx + 1..])
        }
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ActionReply, ActionRequest};
    use crate::transport::{ActionTransport, TransportError};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Replies to `fetchParameter` from a table keyed by the fetched path.
    struct MockFrontend {
        values: HashMap<String, Value>,
        requests: Mutex<Vec<ActionRequest>>,
    }

    impl MockFrontend {
        fn new(values: &[(&str, Value)]) -> Arc<Self> {
            Arc::new(Self {
                values: values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                requests: Mutex::new(vec![]),
            })
        }

        async fn actions(&self) -> Vec<String> {
            self.requests
                .lock()
                .await
                .iter()
                .map(|r| format!("{}.{}", r.path, r.action))
                .collect()
        }
    }

    #[async_trait]
    impl ActionTransport for MockFrontend {
        async fn call_action(&self, request: ActionRequest) -> Result<ActionReply, TransportError> {
            let reply = if request.action == "fetchParameter" {
                let params: Value = serde_json::from_str(&request.parameters).unwrap_or(Value::Null);
                let key = format!("{}.{}", params[0]["macroTarget"].as_str().unwrap_or(""), params[0]["macroVariable"].as_str().unwrap_or(""));
                match self.values.get(&key) {
                    Some(v) => ActionReply::ok(v.to_string()),
                    None => ActionReply::failed(format!("no such parameter {}", key)),
                }
            } else {
                ActionReply::ok("")
            };
            self.requests.lock().await.push(request);
            Ok(reply)
        }

        fn endpoint(&self) -> String {
            "mock:0".to_string()
        }
    }

    fn cube() -> Arc<MockFrontend> {
        MockFrontend::new(&[
            ("frameMap[7].frameInfo.fileInfoExtended.width", json!(512)),
            ("frameMap[7].frameInfo.fileInfoExtended.height", json!(256)),
            ("frameMap[7].frameInfo.fileInfoExtended.depth", json!(10)),
            ("frameMap[7].frameInfo.fileInfoExtended.stokes", json!(1)),
            ("frameMap[7].frameInfo.fileInfoExtended.dimensions", json!(3)),
            ("frameMap[7].requiredChannel", json!(4)),
            ("frameMap[7].requiredStokes", json!(0)),
        ])
    }

    fn image(frontend: Arc<MockFrontend>) -> Image {
        Image::from_parts(Session::with_transport(frontend, 1), 7, "cube.fits")
    }

    #[test]
    fn test_split_file_path() {
        assert_eq!(split_file_path("/d/foo.fits"), ("/d", "foo.fits"));
        assert_eq!(split_file_path("/foo.fits"), ("/", "foo.fits"));
        assert_eq!(split_file_path("/a/b/c.hdf5"), ("/a/b", "c.hdf5"));
        assert_eq!(split_file_path("foo.fits"), ("", "foo.fits"));
    }

    #[tokio::test]
    async fn test_shape_and_metadata_cache() {
        let frontend = cube();
        let image = image(frontend.clone());

        assert_eq!(image.shape().await.unwrap(), vec![10, 256, 512]);
        let fetches = frontend.requests.lock().await.len();
        assert_eq!(fetches, 4);

        assert_eq!(image.width().await.unwrap(), 512);
        assert_eq!(image.shape().await.unwrap(), vec![10, 256, 512]);
        assert_eq!(frontend.requests.lock().await.len(), fetches);
    }

    #[tokio::test]
    async fn test_channel_bounded_by_depth() {
        let frontend = cube();
        let image = image(frontend.clone());

        let err = image.set_channel_stokes(Some(10), None, true).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Invalid parameter for set_channel_stokes: 10 is larger than"));
        assert!(!frontend.actions().await.contains(&"frameMap[7].setChannels".to_string()));

        image.set_channel_stokes(Some(9), None, false).await.unwrap();
        let requests = frontend.requests.lock().await;
        let last = requests.last().unwrap();
        assert_eq!(last.path, "frameMap[7]");
        assert_eq!(last.action, "setChannels");
        assert_eq!(last.parameters, "[9,0,false]");
    }

    #[tokio::test]
    async fn test_channel_defaults_to_current() {
        let frontend = cube();
        let image = image(frontend.clone());

        image.set_channel_stokes(None, Some(0), true).await.unwrap();
        let requests = frontend.requests.lock().await;
        assert_eq!(requests.last().unwrap().parameters, "[4,0,true]");
    }

    #[tokio::test]
    async fn test_scaling_sends_only_relevant_extras() {
        let frontend = cube();
        let image = image(frontend.clone());

        image
            .set_scaling(Scaling::Gamma, Some(1000.0), Some(2.0), Some(0.0), None)
            .await
            .unwrap();
        assert_eq!(
            frontend.actions().await,
            vec!["frameMap[7].renderConfig.setScaling", "frameMap[7].renderConfig.setGamma"]
        );
    }

    #[tokio::test]
    async fn test_contours_accept_arrays() {
        let frontend = cube();
        let image = image(frontend.clone());

        let levels = ndarray::Array1::from(vec![1.0, 2.0, 4.0]);
        image
            .configure_contours(levels, DEFAULT_SMOOTHING_MODE, DEFAULT_SMOOTHING_FACTOR)
            .await
            .unwrap();

        let err = image
            .configure_contours(vec![json!(1), json!("two")], SmoothingMode::NoSmoothing, 1.0)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let requests = frontend.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].action, "setContourConfiguration");
        assert_eq!(requests[0].parameters, "[[1.0,2.0,4.0],2,4.0]");
    }

    #[tokio::test]
    async fn test_channel_histogram_turns_cube_histogram_off() {
        let frontend = cube();
        let image = image(frontend.clone());

        image.use_channel_histogram(true).await.unwrap();
        let requests = frontend.requests.lock().await;
        assert_eq!(requests[0].path, "frameMap[7].renderConfig");
        assert_eq!(requests[0].action, "setUseCubeHistogramContours");
        assert_eq!(requests[0].parameters, "[false]");
    }

    #[tokio::test]
    async fn test_close_addresses_frame_by_macro() {
        let frontend = cube();
        let image = image(frontend.clone());
        assert_eq!(image.to_string(), "1:7:cube.fits");

        image.close().await.unwrap();
        let requests = frontend.requests.lock().await;
        assert_eq!(requests[0].path, "");
        assert_eq!(requests[0].action, "closeFile");
        assert_eq!(requests[0].parameters, r#"[{"macroTarget":"","macroVariable":"frameMap[7]"}]"#);
    }

    #[tokio::test]
    async fn test_from_list() {
        let session = Session::with_transport(cube(), 1);
        let frames = json!([
            {"label": "0: first.fits", "value": 3},
            {"label": "1: second.hdf5", "value": 5},
        ]);
        let images = Image::from_list(&session, &frames).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].image_id(), 5);
        assert_eq!(images[1].file_name(), "second.hdf5");

        let err = Image::from_list(&session, &json!([{"label": "nocolon", "value": 1}])).unwrap_err();
        assert!(err.is_bad_response());
    }

    #[tokio::test]
    async fn test_from_list_keeps_colons_in_file_names() {
        let session = Session::with_transport(cube(), 1);
        let images = Image::from_list(&session, &json!([{"label": "0: a:b.fits", "value": 2}])).unwrap();
        assert_eq!(images[0].file_name(), "a:b.fits");
    }
}
