use ndarray::{ArrayBase, ArrayViewD, Data, Dimension};
use serde::Serialize;
use serde_json::Value;

use super::Macro;

/// One positional argument of an action.
///
/// Literals are sent by value. Macros are sent as placeholder objects and
/// resolved by the frontend when the action runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Literal(Value),
    Macro(Macro),
}

impl Arg {
    /// The JSON form this argument takes on the wire.
    pub fn to_value(&self) -> Value {
        match self {
            Arg::Literal(v) => v.clone(),
            Arg::Macro(m) => serde_json::json!({
                "macroTarget": m.target,
                "macroVariable": m.variable,
            }),
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Arg::Macro(_))
    }
}

/// Encode an argument list as the JSON array carried in `ActionRequest::parameters`.
pub fn encode_arguments(args: &[Arg]) -> Result<String, serde_json::Error> {
    serde_json::to_string(args)
}

/// Convert an n-dimensional array into nested JSON arrays, outermost axis first.
pub fn ndarray_to_value<A, S, D>(array: &ArrayBase<S, D>) -> Value
where
    A: Serialize,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn walk<A: Serialize>(view: ArrayViewD<'_, A>) -> Value {
        if view.ndim() == 0 {
            return view
                .iter()
                .next()
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null);
        }
        Value::Array(view.outer_iter().map(walk).collect())
    }
    walk(array.view().into_dyn())
}

impl From<Macro> for Arg {
    fn from(m: Macro) -> Self {
        Arg::Macro(m)
    }
}

impl From<&Macro> for Arg {
    fn from(m: &Macro) -> Self {
        Arg::Macro(m.clone())
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Literal(v)
    }
}

impl From<&Value> for Arg {
    fn from(v: &Value) -> Self {
        Arg::Literal(v.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Arg::Literal(Value::Array(items.into_iter().map(Into::into).collect()))
    }
}

impl<A, S, D> From<ArrayBase<S, D>> for Arg
where
    A: Serialize,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn from(array: ArrayBase<S, D>) -> Self {
        Arg::Literal(ndarray_to_value(&array))
    }
}

macro_rules! literal_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Literal(Value::from(v))
                }
            }
        )*
    };
}

literal_arg!(&str, String, bool, f64, f32, i32, i64, u32, u64, usize);

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Literal(Value::String(v.clone()))
    }
}
