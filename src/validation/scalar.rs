use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::{display_value, type_name, AttributeSource, ParamError, Parameter};

/// A string, optionally required to contain a match for a regular expression.
#[derive(Debug, Clone)]
pub struct StringParam {
    regex: Option<Regex>,
}

impl StringParam {
    pub fn any() -> Self {
        Self { regex: None }
    }

    /// The value must contain a match for `pattern` (unanchored search).
    pub fn matching(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, false)
    }

    pub fn matching_ignore_case(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, true)
    }

    pub(crate) fn from_regex(regex: Regex) -> Self {
        Self { regex: Some(regex) }
    }

    fn build(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(ignore_case).build()?;
        Ok(Self { regex: Some(regex) })
    }
}

impl Default for StringParam {
    fn default() -> Self {
        Self::any()
    }
}

#[async_trait]
impl Parameter for StringParam {
    fn description(&self) -> String {
        match &self.regex {
            Some(re) => format!("a string matching ``{}``", re.as_str()),
            None => "a string".to_string(),
        }
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let s = value.as_str().ok_or_else(|| {
            ParamError::Type(format!(
                "{} has type {} but a string was expected.",
                display_value(value),
                type_name(value)
            ))
        })?;

        if let Some(re) = &self.regex {
            if !re.is_match(s) {
                return Err(ParamError::Value(format!("{} does not match {}", s, re.as_str())));
            }
        }
        Ok(())
    }
}

/// An integer or floating point scalar with optional bounds.
///
/// Each bound is independently inclusive or exclusive; a missing bound leaves
/// that side unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Number {
    min: Option<f64>,
    max: Option<f64>,
    include_min: bool,
    include_max: bool,
}

impl Number {
    pub fn any() -> Self {
        Self::default()
    }

    /// Both bounds inclusive.
    pub fn between(min: f64, max: f64) -> Self {
        Self::any().at_least(min).at_most(max)
    }

    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.include_min = true;
        self
    }

    pub fn greater_than(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.include_min = false;
        self
    }

    pub fn at_most(mut self, max: f64) -> Self {
        self.max = Some(max);
        self.include_max = true;
        self
    }

    pub fn less_than(mut self, max: f64) -> Self {
        self.max = Some(max);
        self.include_max = false;
        self
    }

    /// Generic constructor used by runtime-evaluated bounds.
    pub fn with_bounds(min: Option<f64>, max: Option<f64>, include_min: bool, include_max: bool) -> Self {
        Self {
            min,
            max,
            include_min,
            include_max,
        }
    }

    pub(crate) fn describe_bounds(
        min: Option<&str>,
        max: Option<&str>,
        include_min: bool,
        include_max: bool,
    ) -> String {
        let lower = min.map(|m| {
            if include_min {
                format!("greater than or equal to {}", m)
            } else {
                format!("greater than {}", m)
            }
        });
        let upper = max.map(|m| {
            if include_max {
                format!("smaller than or equal to {}", m)
            } else {
                format!("smaller than {}", m)
            }
        });

        match (min, max, lower, upper) {
            (Some(lo), Some(hi), _, _) if include_min && include_max => {
                format!("a number between {} and {} (inclusive)", lo, hi)
            }
            (_, _, Some(lower), Some(upper)) => format!("a number {} and {}", lower, upper),
            (_, _, Some(lower), None) => format!("a number {}", lower),
            (_, _, None, Some(upper)) => format!("a number {}", upper),
            _ => "a number".to_string(),
        }
    }
}

#[async_trait]
impl Parameter for Number {
    fn description(&self) -> String {
        let min = self.min.map(|m| m.to_string());
        let max = self.max.map(|m| m.to_string());
        Self::describe_bounds(min.as_deref(), max.as_deref(), self.include_min, self.include_max)
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let n = value.as_f64().ok_or_else(|| {
            ParamError::Type(format!(
                "{} has type {} but a number was expected.",
                display_value(value),
                type_name(value)
            ))
        })?;

        if let Some(min) = self.min {
            if self.include_min && n < min {
                return Err(ParamError::Value(format!("{} is smaller than minimum value {}.", n, min)));
            }
            if !self.include_min && n <= min {
                return Err(ParamError::Value(format!(
                    "{} is smaller than or equal to exclusive minimum value {}.",
                    n, min
                )));
            }
        }

        if let Some(max) = self.max {
            if self.include_max && n > max {
                return Err(ParamError::Value(format!("{} is larger than maximum value {}.", n, max)));
            }
            if !self.include_max && n >= max {
                return Err(ParamError::Value(format!(
                    "{} is larger than or equal to exclusive maximum value {}.",
                    n, max
                )));
            }
        }

        Ok(())
    }
}

/// A boolean. Numeric `0` and `1` are accepted too.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

#[async_trait]
impl Parameter for Boolean {
    fn description(&self) -> String {
        "a boolean".to_string()
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let ok = match value {
            Value::Bool(_) => true,
            Value::Number(n) => matches!(n.as_f64(), Some(f) if f == 0.0 || f == 1.0),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(ParamError::Type(format!("{} is not a boolean value.", display_value(value))))
        }
    }
}

/// Must be null. Combined with [`super::Union`] to make optional parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneParameter;

#[async_trait]
impl Parameter for NoneParameter {
    fn description(&self) -> String {
        "None".to_string()
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        if value.is_null() {
            Ok(())
        } else {
            Err(ParamError::Value(format!("{} is not None.", display_value(value))))
        }
    }
}
