//! Action Protocol
//!
//! Wire-level pieces of the scripting protocol: the request/reply envelope,
//! macros, and the encoding of positional action arguments.

mod arguments;

pub use arguments::{encode_arguments, ndarray_to_value, Arg};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a frontend value that is evaluated on the remote side.
///
/// Sending a macro instead of a literal means the frontend reads the live
/// value of `target.variable` at the moment the action runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Macro {
    #[serde(rename = "macroTarget")]
    pub target: String,
    #[serde(rename = "macroVariable")]
    pub variable: String,
}

impl Macro {
    pub fn new(target: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            variable: variable.into(),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Macro('{}', '{}')", self.target, self.variable)
    }
}

/// Request sent for every dispatched action.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ActionRequest {
    #[prost(uint32, tag = "1")]
    pub session_id: u32,
    #[prost(string, tag = "2")]
    pub path: String,
    #[prost(string, tag = "3")]
    pub action: String,
    /// JSON array of positional arguments.
    #[prost(string, tag = "4")]
    pub parameters: String,
    /// Passed through to the frontend; currently has no effect there.
    #[prost(bool, tag = "5")]
    pub is_async: bool,
}

/// Reply to an [`ActionRequest`]. `response` is empty or a JSON document.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ActionReply {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, tag = "3")]
    pub response: String,
}

impl ActionReply {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            message: String::new(),
            response: response.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            response: String::new(),
        }
    }
}

/// Per-call flags for [`crate::Session::call_action_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Treat an empty response as an error instead of "no value".
    pub response_expected: bool,
    pub r#async: bool,
}

impl CallOptions {
    pub fn expect_response() -> Self {
        Self {
            response_expected: true,
            ..Self::default()
        }
    }
}

/// Split a dotted action path into the store path and the action name.
///
/// Only the last `.` is significant; a path without one targets the root store.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Build a positional argument list, converting each element into an [`Arg`].
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::protocol::Arg>::new() };
    ($($x:expr),+ $(,)?) => {
        vec![$($crate::protocol::Arg::from($x)),+]
    };
}
