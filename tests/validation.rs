//! Parameter Validation Suite
//!
//! Exercises the descriptor framework through its public API, the way a
//! script adding its own validated wrappers would.

use async_trait::async_trait;
use carta_scripting::validation::{
    Arguments, AttributeSource, Boolean, Color, Constant, EvalArg, Evaluate, IterableOf, NoAttributes, NoneOr,
    Number, Parameter, Signature, StringParam, Union,
};
use carta_scripting::{CartaResult, Colormap};
use serde_json::{json, Value};

struct Cube {
    depth: i64,
}

#[async_trait]
impl AttributeSource for Cube {
    async fn attribute(&self, name: &str) -> CartaResult<Option<Value>> {
        Ok(match name {
            "depth" => Some(json!(self.depth)),
            _ => None,
        })
    }
}

#[tokio::test]
async fn test_number_boundaries() {
    let cases = [
        (Number::any().at_least(0.0).at_most(1.0), [true, true, true]),
        (Number::any().greater_than(0.0).at_most(1.0), [false, true, true]),
        (Number::any().at_least(0.0).less_than(1.0), [true, true, false]),
        (Number::any().greater_than(0.0).less_than(1.0), [false, true, false]),
    ];
    for (param, expected) in cases {
        for (value, ok) in [json!(0), json!(0.5), json!(1)].iter().zip(expected) {
            assert_eq!(
                param.validate(value, &NoAttributes).await.is_ok(),
                ok,
                "{} against {}",
                value,
                param.description()
            );
        }
    }
}

#[tokio::test]
async fn test_union_reports_aggregate_description() {
    let param = Union::new(vec![Boolean.boxed(), Number::any().at_least(10.0).boxed()]);
    assert!(param.validate(&json!(true), &NoAttributes).await.is_ok());
    assert!(param.validate(&json!(11), &NoAttributes).await.is_ok());

    let err = param.validate(&json!(5), &NoAttributes).await.unwrap_err();
    assert_eq!(err.to_string(), "5 is not a boolean or a number greater than or equal to 10.");
}

#[tokio::test]
async fn test_iterable_of() {
    let param = IterableOf::new(Color::new());
    assert!(param.validate(&json!([]), &NoAttributes).await.is_ok());
    assert!(param.validate(&json!(["red", "#00ff00"]), &NoAttributes).await.is_ok());

    let err = param
        .validate(&json!(["red", "mauvish", "also-bad"]), &NoAttributes)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("mauvish"));
}

#[tokio::test]
async fn test_custom_signature_with_runtime_bound() {
    let sig = Signature::new("set_channel")
        .param("channel", Evaluate::number(0i64, EvalArg::attr("depth"), true, false))
        .param("colormap", NoneOr::new(Constant::of::<Colormap>()))
        .param("label", StringParam::matching(r"^[A-Z]").unwrap());

    let cube = Cube { depth: 5 };
    let ok = Arguments::new().arg(4).arg(Colormap::Hot).arg("Channel");
    assert!(sig.validate(&ok, &cube).await.is_ok());

    let too_deep = Arguments::new().arg(5);
    let err = sig.validate(&too_deep, &cube).await.unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().starts_with("Invalid parameter for set_channel: 5 is larger than"));

    let no_depth = sig.validate(&Arguments::new().arg(0), &NoAttributes).await.unwrap_err();
    assert!(no_depth.is_validation());

    let described = sig.describe();
    assert_eq!(
        described[0].1,
        "a number greater than or equal to 0 and smaller than depth"
    );
    assert_eq!(described[1].1, "a member of constants::Colormap or None");
}
