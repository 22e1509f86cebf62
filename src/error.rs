//! Error Types
//!
//! Every failure a script can observe is one of these kinds. Validation
//! failures happen before anything is sent; action failures and bad responses
//! come back from the remote side. None of them are retried.

use thiserror::Error;

use crate::transport::TransportError;

pub type CartaResult<T> = std::result::Result<T, CartaError>;

#[derive(Debug, Error)]
pub enum CartaError {
    /// An argument did not satisfy its parameter descriptor. Raised before any RPC.
    #[error("{0}")]
    Validation(String),

    /// The RPC channel failed or the frontend reported that the action failed.
    #[error("{0}")]
    ActionFailed(String),

    /// A response was required but missing, or could not be decoded.
    #[error("{0}")]
    BadResponse(String),

    #[error("Could not encode action parameters: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CartaError {
    pub(crate) fn transport(description: &str, err: &TransportError) -> Self {
        CartaError::ActionFailed(format!("{} failed: {}", description, err))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CartaError::Validation(_))
    }

    pub fn is_action_failed(&self) -> bool {
        matches!(self, CartaError::ActionFailed(_))
    }

    pub fn is_bad_response(&self) -> bool {
        matches!(self, CartaError::BadResponse(_))
    }
}
