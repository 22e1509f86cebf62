use async_trait::async_trait;
use serde_json::Value;

use super::{display_value, type_name, AttributeSource, NoneParameter, Number, ParamError, Parameter};
use crate::constants::ConstantSet;

type Normalizer = fn(&Value) -> Value;

/// Lower-case string values; other values are returned unchanged.
pub fn lowercase(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}

/// Must equal one of a fixed list of values, after optional normalization.
#[derive(Clone)]
pub struct OneOf {
    options: Vec<Value>,
    normalize: Option<Normalizer>,
    description: String,
}

impl OneOf {
    pub fn new<I, V>(options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let options: Vec<Value> = options.into_iter().map(Into::into).collect();
        let description = format!(
            "one of {}",
            options.iter().map(display_value).collect::<Vec<_>>().join(", ")
        );
        Self {
            options,
            normalize: None,
            description,
        }
    }

    /// Transform values before comparing them, e.g. [`lowercase`].
    pub fn normalized(mut self, normalize: Normalizer) -> Self {
        self.normalize = Some(normalize);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn options(&self) -> &[Value] {
        &self.options
    }
}

#[async_trait]
impl Parameter for OneOf {
    fn description(&self) -> String {
        self.description.clone()
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let normalized = match self.normalize {
            Some(f) => f(value),
            None => value.clone(),
        };
        if self.options.contains(&normalized) {
            Ok(())
        } else {
            Err(ParamError::Value(format!("{} is not {}", display_value(value), self.description)))
        }
    }
}

/// Must be a member of one of the constant vocabularies in [`crate::constants`].
#[derive(Clone)]
pub struct Constant {
    inner: OneOf,
}

impl Constant {
    pub fn of<T: ConstantSet>() -> Self {
        let mut options: Vec<Value> = Vec::new();
        for member in T::members() {
            let value = member.value();
            if !options.contains(&value) {
                options.push(value);
            }
        }
        let inner = OneOf::new(options).with_description(format!("a member of :obj:`constants::{}`", T::NAME));
        Self { inner }
    }

    pub fn normalized(mut self, normalize: Normalizer) -> Self {
        self.inner = self.inner.normalized(normalize);
        self
    }

    pub fn options(&self) -> &[Value] {
        self.inner.options()
    }
}

#[async_trait]
impl Parameter for Constant {
    fn description(&self) -> String {
        self.inner.description()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        self.inner.validate(value, owner).await
    }
}

/// Satisfied by any one of several descriptors, tried in order.
pub struct Union {
    options: Vec<Box<dyn Parameter>>,
    description: String,
}

impl Union {
    pub fn new(options: Vec<Box<dyn Parameter>>) -> Self {
        let description = options
            .iter()
            .map(|o| o.description())
            .collect::<Vec<_>>()
            .join(" or ");
        Self { options, description }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Parameter for Union {
    fn description(&self) -> String {
        self.description.clone()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        for option in &self.options {
            match option.validate(value, owner).await {
                Ok(()) => return Ok(()),
                // A failed remote lookup says nothing about the value.
                Err(e) if e.is_remote() => return Err(e),
                Err(_) => continue,
            }
        }
        Err(ParamError::Value(format!(
            "{} is not {}.",
            display_value(value),
            self.description
        )))
    }
}

/// The wrapped descriptor, or null. Null means "leave unchanged".
pub struct NoneOr(Union);

impl NoneOr {
    pub fn new(param: impl Parameter + 'static) -> Self {
        NoneOr(Union::new(vec![param.boxed(), NoneParameter.boxed()]))
    }
}

#[async_trait]
impl Parameter for NoneOr {
    fn description(&self) -> String {
        self.0.description()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        self.0.validate(value, owner).await
    }
}

/// A sequence whose every element satisfies the wrapped descriptor.
pub struct IterableOf {
    param: Box<dyn Parameter>,
}

impl IterableOf {
    pub fn new(param: impl Parameter + 'static) -> Self {
        Self { param: Box::new(param) }
    }
}

#[async_trait]
impl Parameter for IterableOf {
    fn description(&self) -> String {
        format!("an iterable of {}", self.param.description())
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let items = value.as_array().ok_or_else(|| {
            ParamError::Type(format!(
                "{} has type {} but an iterable was expected.",
                display_value(value),
                type_name(value)
            ))
        })?;
        for item in items {
            self.param.validate(item, owner).await?;
        }
        Ok(())
    }
}

/// An argument to a runtime-evaluated descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalArg {
    Literal(Value),
    /// Looked up on the owner of the operation at validation time.
    Attr(String),
}

impl EvalArg {
    pub fn attr(name: impl Into<String>) -> Self {
        EvalArg::Attr(name.into())
    }

    fn describe(&self) -> String {
        match self {
            EvalArg::Literal(v) => display_value(v),
            EvalArg::Attr(name) => format!("``{}``", name),
        }
    }
}

impl From<f64> for EvalArg {
    fn from(v: f64) -> Self {
        EvalArg::Literal(Value::from(v))
    }
}

impl From<i64> for EvalArg {
    fn from(v: i64) -> Self {
        EvalArg::Literal(Value::from(v))
    }
}

type Builder = Box<dyn Fn(&[Value]) -> Result<Box<dyn Parameter>, ParamError> + Send + Sync>;

/// A descriptor whose arguments depend on the object being validated against.
///
/// Attribute arguments are resolved through the owner immediately before
/// validation, the concrete descriptor is built from the resolved values, and
/// validation is delegated to it.
pub struct Evaluate {
    args: Vec<EvalArg>,
    build: Builder,
    description: String,
}

impl Evaluate {
    pub fn new<F>(args: Vec<EvalArg>, description: impl Into<String>, build: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Box<dyn Parameter>, ParamError> + Send + Sync + 'static,
    {
        Self {
            args,
            build: Box::new(build),
            description: description.into(),
        }
    }

    /// A [`Number`] whose bounds may be owner attributes. A null bound is unconstrained.
    pub fn number(min: impl Into<EvalArg>, max: impl Into<EvalArg>, include_min: bool, include_max: bool) -> Self {
        let (min, max) = (min.into(), max.into());
        let description = Number::describe_bounds(
            Some(min.describe().as_str()),
            Some(max.describe().as_str()),
            include_min,
            include_max,
        );
        Self::new(vec![min, max], description, move |resolved| {
            let bound = |v: &Value| -> Result<Option<f64>, ParamError> {
                if v.is_null() {
                    return Ok(None);
                }
                v.as_f64()
                    .map(Some)
                    .ok_or_else(|| ParamError::Type(format!("bound {} is not a number.", display_value(v))))
            };
            let min = resolved.first().map(bound).transpose()?.flatten();
            let max = resolved.get(1).map(bound).transpose()?.flatten();
            Ok(Number::with_bounds(min, max, include_min, include_max).boxed())
        })
    }

    async fn resolve(&self, owner: &dyn AttributeSource) -> Result<Vec<Value>, ParamError> {
        let mut resolved = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                EvalArg::Literal(v) => resolved.push(v.clone()),
                EvalArg::Attr(name) => match owner.attribute(name).await? {
                    Some(v) => resolved.push(v),
                    None => {
                        return Err(ParamError::Attribute(format!(
                            "the object has no attribute {} to bound this parameter.",
                            name
                        )))
                    }
                },
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Parameter for Evaluate {
    fn description(&self) -> String {
        self.description.clone()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let resolved = self.resolve(owner).await?;
        let param = (self.build)(&resolved)?;
        param.validate(value, owner).await
    }
}
