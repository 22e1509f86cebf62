use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::combinators::lowercase;
use super::{display_value, type_name, AttributeSource, OneOf, ParamError, Parameter, StringParam, Union};

/// The 147 named HTML colors.
pub const COLOR_NAMES: [&str; 147] = [
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue", "darkcyan",
    "darkgoldenrod", "darkgray", "darkgrey", "darkgreen", "darkkhaki", "darkmagenta",
    "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon", "darkseagreen",
    "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise", "darkviolet", "deeppink",
    "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick", "floralwhite", "forestgreen",
    "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod", "gray", "grey", "green",
    "greenyellow", "honeydew", "hotpink", "indianred", "indigo", "ivory", "khaki", "lavender",
    "lavenderblush", "lawngreen", "lemonchiffon", "lightblue", "lightcoral", "lightcyan",
    "lightgoldenrodyellow", "lightgray", "lightgrey", "lightgreen", "lightpink", "lightsalmon",
    "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey", "lightsteelblue",
    "lightyellow", "lime", "limegreen", "linen", "magenta", "maroon", "mediumaquamarine",
    "mediumblue", "mediumorchid", "mediumpurple", "mediumseagreen", "mediumslateblue",
    "mediumspringgreen", "mediumturquoise", "mediumvioletred", "midnightblue", "mintcream",
    "mistyrose", "moccasin", "navajowhite", "navy", "oldlace", "olive", "olivedrab", "orange",
    "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise", "palevioletred",
    "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue", "purple", "red", "rosybrown",
    "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue", "tan",
    "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke", "yellow",
    "yellowgreen",
];

lazy_static! {
    static ref HEX6: Regex = Regex::new(r"(?i)^#[0-9a-f]{6}$").unwrap();
    static ref HEX3: Regex = Regex::new(r"(?i)^#[0-9a-f]{3}$").unwrap();
    static ref TUPLE: Regex = Regex::new(r"^(hsla?|rgba?)\((.*)\)$").unwrap();
}

/// An `rgb()`, `rgba()`, `hsl()` or `hsla()` color string.
///
/// Not normally used directly; see [`Color`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TupleColor;

impl TupleColor {
    fn assert_length(params: &[&str], number: usize) -> Result<(), String> {
        if params.len() != number {
            return Err(format!("expected {} parameters but got {}.", number, params.len()));
        }
        Ok(())
    }

    fn assert_percentage(param: &str) -> Result<(), String> {
        let valid = param
            .strip_suffix('%')
            .and_then(|p| p.parse::<f64>().ok())
            .map(|p| (0.0..=100.0).contains(&p))
            .unwrap_or(false);
        if valid {
            Ok(())
        } else {
            Err(format!("{} is not a valid percentage.", param))
        }
    }

    fn assert_between(param: &str, min: f64, max: f64) -> Result<(), String> {
        match param.parse::<f64>() {
            Ok(p) if (min..=max).contains(&p) => Ok(()),
            _ => Err(format!("{} is not a number between {} and {}.", param, min, max)),
        }
    }

    fn validate_rgb(params: &[&str]) -> Result<(), String> {
        Self::assert_length(params, 3)?;
        let all_percentages = params.iter().all(|p| Self::assert_percentage(p).is_ok());
        let all_bytes = params.iter().all(|p| Self::assert_between(p, 0.0, 255.0).is_ok());
        if all_percentages || all_bytes {
            Ok(())
        } else {
            Err("parameters must either all be percentages or all be numbers between 0 and 255.".to_string())
        }
    }

    fn validate_rgba(params: &[&str]) -> Result<(), String> {
        Self::assert_length(params, 4)?;
        Self::validate_rgb(&params[..3])?;
        Self::assert_between(params[3], 0.0, 1.0)
    }

    fn validate_hsl(params: &[&str]) -> Result<(), String> {
        Self::assert_length(params, 3)?;
        Self::assert_between(params[0], 0.0, 360.0)?;
        Self::assert_percentage(params[1])?;
        Self::assert_percentage(params[2])
    }

    fn validate_hsla(params: &[&str]) -> Result<(), String> {
        Self::assert_length(params, 4)?;
        Self::validate_hsl(&params[..3])?;
        Self::assert_between(params[3], 0.0, 1.0)
    }
}

#[async_trait]
impl Parameter for TupleColor {
    fn description(&self) -> String {
        "an HTML color tuple".to_string()
    }

    async fn validate(&self, value: &Value, _owner: &dyn AttributeSource) -> Result<(), ParamError> {
        let raw = value.as_str().ok_or_else(|| {
            ParamError::Type(format!(
                "{} has type {} but a string was expected.",
                display_value(value),
                type_name(value)
            ))
        })?;
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        let caps = TUPLE
            .captures(&compact)
            .ok_or_else(|| ParamError::Value(format!("{} is not {}.", compact, self.description())))?;
        let func = &caps[1];
        let params: Vec<&str> = caps[2].split(',').collect();

        let result = match func {
            "rgb" => Self::validate_rgb(&params),
            "rgba" => Self::validate_rgba(&params),
            "hsl" => Self::validate_hsl(&params),
            _ => Self::validate_hsla(&params),
        };
        result.map_err(|e| {
            ParamError::Value(format!(
                "{} is not a valid {} color tuple: {}",
                compact,
                func.to_uppercase(),
                e
            ))
        })
    }
}

/// Any HTML color: a named color, a 6- or 3-digit hex triplet, or an RGB(A)/HSL(A) tuple.
pub struct Color(Union);

impl Color {
    pub fn new() -> Self {
        let options = vec![
            OneOf::new(COLOR_NAMES).normalized(lowercase).boxed(),
            StringParam::from_regex(HEX6.clone()).boxed(),
            StringParam::from_regex(HEX3.clone()).boxed(),
            TupleColor.boxed(),
        ];
        Color(Union::new(options).with_description("an HTML color specification"))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Parameter for Color {
    fn description(&self) -> String {
        self.0.description()
    }

    async fn validate(&self, value: &Value, owner: &dyn AttributeSource) -> Result<(), ParamError> {
        self.0.validate(value, owner).await
    }
}
