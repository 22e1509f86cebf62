//! Parameter Validation
//!
//! Descriptors of the permitted types and values of the parameters passed to
//! [`crate::Session`] and [`crate::Image`] operations. Each operation owns a
//! [`Signature`] binding descriptors to its parameters, and checks its
//! arguments against it before anything is sent to the frontend.
//!
//! Descriptions may contain light documentation markup (``:obj:`x` `` and
//! ``` ``x`` ```); it is stripped from validation error messages.

mod color;
mod combinators;
mod scalar;
mod signature;

pub use color::{Color, TupleColor, COLOR_NAMES};
pub use combinators::{lowercase, Constant, EvalArg, Evaluate, IterableOf, NoneOr, OneOf, Union};
pub use scalar::{Boolean, NoneParameter, Number, StringParam};
pub use signature::{Arguments, Signature};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::{CartaError, CartaResult};

/// Why a single value failed its descriptor.
#[derive(Debug, Error)]
pub enum ParamError {
    /// The value has the wrong shape or type.
    #[error("{0}")]
    Type(String),

    /// The type is right but the value is not permitted.
    #[error("{0}")]
    Value(String),

    /// A runtime bound referred to an attribute the owner does not have.
    #[error("{0}")]
    Attribute(String),

    /// Resolving a runtime bound required a remote call, and it failed.
    #[error(transparent)]
    Remote(#[from] CartaError),
}

impl ParamError {
    pub(crate) fn is_remote(&self) -> bool {
        matches!(self, ParamError::Remote(_))
    }
}

/// The object an operation is called on, as seen by runtime-bounded descriptors.
#[async_trait]
pub trait AttributeSource: Send + Sync {
    /// Look up a named attribute. `Ok(None)` means the owner has no such attribute.
    async fn attribute(&self, name: &str) -> CartaResult<Option<Value>>;
}

/// An owner without attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributes;

#[async_trait]
impl AttributeSource for NoAttributes {
    async fn attribute(&self, _name: &str) -> CartaResult<Option<Value>> {
        Ok(None)
    }
}

/// A validation rule for one argument.
#[async_trait]
pub trait Parameter: Send + Sync {
    /// Human-readable description of the constraint.
    fn description(&self) -> String;

    /// Check `value`, consulting `owner` only for runtime bounds.
    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError>;

    fn boxed(self) -> Box<dyn Parameter>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

#[async_trait]
impl<P: Parameter + ?Sized> Parameter for Box<P> {
    fn description(&self) -> String {
        (**self).description()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        (**self).validate(value, owner).await
    }
}

/// Type name used in error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value for messages; strings are shown without quotes.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
