//! Client Configuration
//!
//! Connection coordinates for a frontend session, read from the environment
//! (a `.env` file is honoured). Command-line flags override these.

use std::env;

use crate::error::{CartaError, CartaResult};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_GRPC_PORT: u16 = 50051;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// No default: a session id has to come from the running frontend.
    pub session_id: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_GRPC_PORT,
            session_id: None,
        }
    }
}

impl ClientConfig {
    /// Load `CARTA_HOST`, `CARTA_GRPC_PORT` and `CARTA_SESSION_ID`.
    pub fn from_env() -> CartaResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> CartaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("CARTA_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("CARTA_GRPC_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| CartaError::Config(format!("CARTA_GRPC_PORT={:?}: {}", raw, e)))?,
            None => DEFAULT_GRPC_PORT,
        };

        let session_id = lookup("CARTA_SESSION_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|e| CartaError::Config(format!("CARTA_SESSION_ID={:?}: {}", raw, e)))
            })
            .transpose()?;

        Ok(Self { host, port, session_id })
    }

    /// `host:port`, as passed to [`crate::Session::connect`].
    pub fn uri(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
