use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{AttributeSource, ParamError, Parameter};
use crate::error::{CartaError, CartaResult};

lazy_static! {
    static ref OBJ_MARKUP: Regex = Regex::new(r":obj:`([^`]*)`").unwrap();
    static ref LITERAL_MARKUP: Regex = Regex::new(r"``([^`]*)``").unwrap();
}

/// Strip documentation markup from a description or error message.
pub(crate) fn strip_markup(text: &str) -> String {
    let text = OBJ_MARKUP.replace_all(text, "$1");
    LITERAL_MARKUP.replace_all(&text, "$1").into_owned()
}

/// The arguments of one operation invocation, as JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            keyword: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword_values(&self) -> &[(String, Value)] {
        &self.keyword
    }
}

/// Descriptors bound to the parameters of one operation, in declaration order.
///
/// Positional arguments are matched by position and keyword arguments by
/// name. Parameters declared without a descriptor, and positional arguments
/// beyond the declared list, are not checked.
pub struct Signature {
    operation: String,
    params: Vec<(String, Option<Box<dyn Parameter>>)>,
}

impl Signature {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, descriptor: impl Parameter + 'static) -> Self {
        self.params.push((name.into(), Some(descriptor.boxed())));
        self
    }

    /// Declare a parameter that is passed through without checks.
    pub fn unchecked(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), None));
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Check every argument against its descriptor.
    ///
    /// Descriptor failures become [`CartaError::Validation`]. A remote error
    /// raised while resolving a runtime bound is returned unchanged.
    pub async fn validate(&self, args: &Arguments, owner: &dyn AttributeSource) -> CartaResult<()> {
        for ((_, descriptor), value) in self.params.iter().zip(&args.positional) {
            if let Some(descriptor) = descriptor {
                self.check(descriptor.as_ref(), value, owner).await?;
            }
        }

        for (name, value) in &args.keyword {
            match self.params.iter().find(|(param, _)| param == name) {
                Some((_, Some(descriptor))) => self.check(descriptor.as_ref(), value, owner).await?,
                Some((_, None)) => {}
                None => {
                    return Err(self.failure(&format!("unexpected keyword argument {}.", name)));
                }
            }
        }

        Ok(())
    }

    async fn check(&self, descriptor: &dyn Parameter, value: &Value, owner: &dyn AttributeSource) -> CartaResult<()> {
        match descriptor.validate(value, owner).await {
            Ok(()) => Ok(()),
            Err(ParamError::Remote(e)) => Err(e),
            Err(e) => Err(self.failure(&e.to_string())),
        }
    }

    fn failure(&self, detail: &str) -> CartaError {
        let message = format!("Invalid parameter for {}: {}", self.operation, strip_markup(detail));
        debug!("{}", message);
        CartaError::Validation(message)
    }

    /// `(name, description)` for every parameter, markup stripped.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(name, descriptor)| {
                let description = descriptor
                    .as_ref()
                    .map(|d| strip_markup(&d.description()))
                    .unwrap_or_else(|| "any value".to_string());
                (name.clone(), description)
            })
            .collect()
    }

    /// Substitute `{0}`, `{1}`, ... in a help template with the parameter descriptions.
    pub fn render_doc(&self, template: &str) -> String {
        let mut doc = template.to_string();
        for (idx, (_, descriptor)) in self.params.iter().enumerate() {
            if let Some(descriptor) = descriptor {
                doc = doc.replace(&format!("{{{}}}", idx), &descriptor.description());
            }
        }
        doc
    }
}
