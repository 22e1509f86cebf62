use async_trait::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Endpoint;
use tracing::debug;

use super::{ActionTransport, TransportError};
use crate::protocol::{ActionReply, ActionRequest};

const CALL_ACTION_PATH: &str = "/CartaService.CartaBackend/CallAction";

/// Unary gRPC client for the backend's `CallAction` method.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    uri: String,
}

impl GrpcTransport {
    /// `uri` is `host:port`; the scheme is added if missing.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let uri = if uri.contains("://") {
            uri
        } else {
            format!("http://{}", uri)
        };
        Self { uri }
    }
}

#[async_trait]
impl ActionTransport for GrpcTransport {
    async fn call_action(&self, request: ActionRequest) -> Result<ActionReply, TransportError> {
        let endpoint = Endpoint::from_shared(self.uri.clone()).map_err(|e| TransportError::InvalidUri {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;

        // The channel lives only for this call.
        let channel = endpoint.connect().await.map_err(|e| TransportError::Connect {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;
        debug!("Opened channel to {}", self.uri);

        let mut client = tonic::client::Grpc::new(channel);
        client
            .ready()
            .await
            .map_err(|e| TransportError::Other(format!("service was not ready: {}", e)))?;

        let codec: ProstCodec<ActionRequest, ActionReply> = ProstCodec::default();
        let path = PathAndQuery::from_static(CALL_ACTION_PATH);
        let response = client.unary(tonic::Request::new(request), path, codec).await?;

        Ok(response.into_inner())
    }

    fn endpoint(&self) -> String {
        self.uri.clone()
    }
}
