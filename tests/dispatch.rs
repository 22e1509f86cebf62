//! Action Dispatch Suite
//!
//! Drives a session against an in-process backend and checks what goes over
//! the wire and how replies are classified.

mod common;

use carta_scripting::protocol::{ActionReply, CallOptions, Macro};
use carta_scripting::{args, Colormap, Session, TransportError};
use common::{file_browser_frontend, MockBackend};
use serde_json::{json, Value};

#[tokio::test]
async fn test_failed_action_is_never_decoded() {
    let backend = MockBackend::new(|_| {
        Ok(ActionReply {
            success: false,
            message: "no such store".to_string(),
            response: "{this is not json".to_string(),
        })
    });
    let session = Session::with_transport(backend, 1);

    let err = session
        .call_action_with("missingStore.doThing", args![1], CallOptions::expect_response())
        .await
        .unwrap_err();
    assert!(err.is_action_failed());
    assert_eq!(
        err.to_string(),
        "CARTA scripting action missingStore.doThing called with parameters [1] failed: no such store"
    );
}

#[tokio::test]
async fn test_empty_response_when_one_was_expected() {
    let session = Session::with_transport(MockBackend::replying(ActionReply::ok("")), 1);

    let err = session
        .call_action_with("frameNames", args![], CallOptions::expect_response())
        .await
        .unwrap_err();
    assert!(err.is_bad_response());
    assert!(err.to_string().contains("expected a response, but did not receive one"));

    let none = session.call_action("frameNames", args![]).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_json_response_is_decoded() {
    let session = Session::with_transport(MockBackend::replying(ActionReply::ok(r#"{"a":1}"#)), 1);
    let value = session.call_action("anything", args![]).await.unwrap();
    assert_eq!(value, Some(json!({"a": 1})));
}

#[tokio::test]
async fn test_transport_error_is_an_action_failure() {
    let backend = MockBackend::new(|_| Err(TransportError::Status(tonic::Status::unavailable("backend down"))));
    let session = Session::with_transport(backend, 1);

    let err = session.call_action("toggleLabels", args![]).await.unwrap_err();
    assert!(err.is_action_failed());
    assert!(err.to_string().contains("CARTA scripting action .toggleLabels called with parameters []"));
    assert!(err.to_string().contains("backend down"));
}

#[tokio::test]
async fn test_macro_arguments_reach_the_backend_as_placeholders() {
    let backend = MockBackend::replying(ActionReply::ok(""));
    let session = Session::with_transport(backend.clone(), 9);

    let starting = Macro::new("fileBrowserStore", "startingDirectory");
    session
        .call_action("fileBrowserStore.getFileList", args![starting.clone()])
        .await
        .unwrap();

    let requests = backend.requests().await;
    let params: Value = serde_json::from_str(&requests[0].parameters).unwrap();
    let decoded: Macro = serde_json::from_value(params[0].clone()).unwrap();
    assert_eq!(decoded, starting);
    assert_eq!(requests[0].session_id, 9);
}

#[tokio::test]
async fn test_open_image_end_to_end() {
    let backend = file_browser_frontend();
    let session = Session::with_transport(backend.clone(), 1);

    let image = session.open_image("/d/foo.fits", None).await.unwrap();
    assert_eq!(image.image_id(), 42);
    assert_eq!(image.file_name(), "foo.fits");

    let requests = backend.requests().await;
    let open = requests.iter().find(|r| r.action == "openFile").unwrap();
    assert_eq!(open.path, "");
    assert_eq!(open.parameters, r#"["/d","foo.fits",""]"#);

    // The directory is put back after loading.
    let restore = requests
        .iter()
        .filter(|r| r.action == "saveStartingDirectory")
        .last()
        .unwrap();
    assert_eq!(restore.parameters, r#"["/d"]"#);

    image.set_zoom(2.0, true).await.unwrap();
    let requests = backend.requests().await;
    let zoom = requests.last().unwrap();
    assert_eq!(zoom.path, "frameMap[42]");
    assert_eq!(zoom.action, "setZoom");
    assert_eq!(zoom.parameters, "[2.0,true]");
}

#[tokio::test]
async fn test_relative_paths_resolve_against_pwd() {
    let backend = file_browser_frontend();
    let session = Session::with_transport(backend.clone(), 1);

    assert_eq!(session.pwd().await.unwrap(), "/d");
    let image = session.append_image("bar.hdf5", Some("1")).await.unwrap();
    assert_eq!(image.file_name(), "bar.hdf5");
    assert_eq!(image.shape().await.unwrap(), vec![80, 100]);

    let requests = backend.requests().await;
    let append = requests.iter().find(|r| r.action == "appendFile").unwrap();
    assert_eq!(append.parameters, r#"["/d","bar.hdf5","1"]"#);
}

#[tokio::test]
async fn test_non_integer_image_id_is_a_bad_response() {
    let backend = MockBackend::new(|request| {
        Ok(match request.action.as_str() {
            "openFile" => ActionReply::ok(r#""not an id""#),
            "fetchParameter" => ActionReply::ok(r#""""#),
            _ => ActionReply::ok(""),
        })
    });
    let session = Session::with_transport(backend, 1);

    let err = session.open_image("/foo.fits", None).await.unwrap_err();
    assert!(err.is_bad_response());
}

#[tokio::test]
async fn test_invalid_arguments_send_nothing() {
    let backend = file_browser_frontend();
    let session = Session::with_transport(backend.clone(), 1);

    let err = session.open_image("/d/foo.fits", Some("primary")).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(backend.call_count().await, 0);

    let image = session.open_image("/d/foo.fits", None).await.unwrap();
    let before = backend.call_count().await;

    let err = image.set_colormap("not-a-colormap", false).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Invalid parameter for set_colormap: not-a-colormap is not a member of constants::Colormap"
    );

    let err = image.set_percentile_rank(100.5).await.unwrap_err();
    assert!(err.is_validation());

    let err = image.set_contour_color("rgb(300,0,0)").await.unwrap_err();
    assert!(err.is_validation());

    assert_eq!(backend.call_count().await, before);

    image.set_colormap(Colormap::Magma, true).await.unwrap();
    let requests = backend.requests().await;
    assert_eq!(requests.len(), before + 2);
    assert_eq!(requests[before].parameters, r#"["magma"]"#);
    assert_eq!(requests[before + 1].parameters, "[true]");
}

#[tokio::test]
async fn test_ls_sorts_files_and_directories() {
    let backend = MockBackend::new(|request| {
        Ok(match common::fetched(request) {
            Some((target, variable)) if target == "fileBrowserStore" && variable == "fileList" => ActionReply::ok(
                r#"{"directory": "d", "files": [{"name": "b.fits"}, {"name": "a.fits"}], "subdirectories": ["c"]}"#,
            ),
            _ => ActionReply::ok(""),
        })
    });
    let session = Session::with_transport(backend, 1);
    assert_eq!(session.ls().await.unwrap(), vec!["a.fits", "b.fits", "c/"]);
}

#[tokio::test]
async fn test_image_calls_forward_options() {
    let backend = file_browser_frontend();
    let session = Session::with_transport(backend.clone(), 1);
    let image = session.open_image("/d/foo.fits", None).await.unwrap();

    let none = image.call_action("renderConfig.histogramMin", args![]).await.unwrap();
    assert!(none.is_none());

    let err = image
        .call_action_with("renderConfig.histogramMin", args![], CallOptions::expect_response())
        .await
        .unwrap_err();
    assert!(err.is_bad_response());
    assert!(err
        .to_string()
        .contains("CARTA scripting action frameMap[42].renderConfig.histogramMin"));

    let options = CallOptions {
        r#async: true,
        ..CallOptions::default()
    };
    image.call_action_with("renderConfig.setGamma", args![1.5], options).await.unwrap();
    let requests = backend.requests().await;
    let gamma = requests.last().unwrap();
    assert_eq!(gamma.path, "frameMap[42].renderConfig");
    assert!(gamma.is_async);
}

#[tokio::test]
async fn test_async_flag_reaches_the_backend() {
    let backend = MockBackend::replying(ActionReply::ok(""));
    let session = Session::with_transport(backend.clone(), 1);

    let options = CallOptions {
        r#async: true,
        ..CallOptions::default()
    };
    session.call_action_with("animatorStore.play", args![], options).await.unwrap();
    session.call_action("animatorStore.stop", args![]).await.unwrap();

    let requests = backend.requests().await;
    assert!(requests[0].is_async);
    assert!(!requests[1].is_async);
}

#[tokio::test]
async fn test_undecodable_response_is_reported_in_full() {
    let raw = format!("{{not json {}", "x".repeat(2000));
    let session = Session::with_transport(MockBackend::replying(ActionReply::ok(raw.clone())), 1);

    let err = session.call_action("anything", args![]).await.unwrap_err();
    assert!(err.is_bad_response());
    assert!(err.to_string().contains(&raw));
}
