//! Shared mocks for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use carta_scripting::protocol::{ActionReply, ActionRequest};
use carta_scripting::{ActionTransport, TransportError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

type Responder = Box<dyn Fn(&ActionRequest) -> Result<ActionReply, TransportError> + Send + Sync>;

/// In-process stand-in for the backend. Every request is recorded and
/// answered by the responder.
pub struct MockBackend {
    responder: Responder,
    requests: Mutex<Vec<ActionRequest>>,
}

impl MockBackend {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ActionRequest) -> Result<ActionReply, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(vec![]),
        })
    }

    /// Answer every request with the same reply.
    pub fn replying(reply: ActionReply) -> Arc<Self> {
        Self::new(move |_| Ok(reply.clone()))
    }

    pub async fn requests(&self) -> Vec<ActionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ActionTransport for MockBackend {
    async fn call_action(&self, request: ActionRequest) -> Result<ActionReply, TransportError> {
        let reply = (self.responder)(&request);
        self.requests.lock().await.push(request);
        reply
    }

    fn endpoint(&self) -> String {
        "mock-backend:50051".to_string()
    }
}

/// `(macroTarget, macroVariable)` of a `fetchParameter` request.
pub fn fetched(request: &ActionRequest) -> Option<(String, String)> {
    if request.action != "fetchParameter" {
        return None;
    }
    let params: Value = serde_json::from_str(&request.parameters).ok()?;
    let target = params.get(0)?.get("macroTarget")?.as_str()?.to_string();
    let variable = params.get(0)?.get("macroVariable")?.as_str()?.to_string();
    Some((target, variable))
}

/// A frontend whose file browser sits in `/d` and which loads every file as image 42.
pub fn file_browser_frontend() -> Arc<MockBackend> {
    MockBackend::new(|request| {
        let reply = match (request.path.as_str(), request.action.as_str()) {
            ("", "openFile") | ("", "appendFile") => ActionReply::ok("42"),
            ("", "fetchParameter") => match fetched(request) {
                Some((target, variable)) if target == "fileBrowserStore.fileList" && variable == "directory" => {
                    ActionReply::ok(r#""d""#)
                }
                Some((target, variable)) if target == "frameMap[42].frameInfo.fileInfoExtended" => {
                    match variable.as_str() {
                        "dimensions" => ActionReply::ok("2"),
                        "width" => ActionReply::ok("100"),
                        "height" => ActionReply::ok("80"),
                        _ => ActionReply::failed("unknown attribute"),
                    }
                }
                _ => ActionReply::failed("unknown parameter"),
            },
            _ => ActionReply::ok(""),
        };
        Ok(reply)
    })
}
