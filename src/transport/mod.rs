//! Action Transport
//!
//! The request/response channel actions travel over. The session only needs
//! "send one request, get one reply"; the gRPC implementation opens a fresh
//! channel for every call and drops it when the call returns.

mod grpc;

pub use grpc::GrpcTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{ActionReply, ActionRequest};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid backend address {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("could not connect to {uri}: {reason}")]
    Connect { uri: String, reason: String },

    #[error("{0}")]
    Status(#[from] tonic::Status),

    #[error("{0}")]
    Other(String),
}

/// Trait for channels that can carry a single action request.
#[async_trait]
pub trait ActionTransport: Send + Sync {
    /// Send the request and wait for its single reply.
    async fn call_action(&self, request: ActionRequest) -> Result<ActionReply, TransportError>;

    /// Human-readable endpoint, used in logs.
    fn endpoint(&self) -> String;
}
