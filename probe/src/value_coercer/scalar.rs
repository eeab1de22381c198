//! Scalar conversions: booleans, integers, floats, strings and enum labels

use error_stack::Report;
use serde_json::Value as Token;

use crate::error::{Error, Result};
use crate::model::{EnumType, Value, ValueType};

const TRUTHY: &[&str] = &["true", "1", "yes", "on", "y"];
const FALSY: &[&str] = &["false", "0", "no", "off", "n"];

/// 2^63, the first float outside the `i64` range
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

pub(super) fn to_bool(field: &str, token: &Token) -> Result<Value> {
    match token {
        Token::Bool(b) => Ok(Value::Bool(*b)),
        Token::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Token::String(s) => {
            let lowered = s.trim().to_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSY.contains(&lowered.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(Report::new(Error::coercion(
                    field,
                    ValueType::Bool,
                    format!("'{s}' is not a boolean"),
                )))
            }
        },
        other => Err(Report::new(Error::coercion(
            field,
            ValueType::Bool,
            format!("expected a boolean, got {other}"),
        ))),
    }
}

/// Integer conversion with range checking against `target` (`Int` is 32-bit, `Long` 64-bit)
pub(super) fn to_int(field: &str, token: &Token, target: &ValueType) -> Result<Value> {
    let parsed = match token {
        Token::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                Err(format!("{n} overflows a 64-bit integer"))
            } else {
                n.as_f64()
                    .map_or_else(|| Err(format!("{n} is not a number")), integral)
            }
        },
        Token::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().or_else(|_| {
                trimmed
                    .parse::<f64>()
                    .map_err(|_| format!("'{s}' is not an integer"))
                    .and_then(integral)
            })
        },
        other => Err(format!("expected an integer, got {other}")),
    };

    let value = parsed.map_err(|reason| Report::new(Error::coercion(field, target, reason)))?;
    if *target == ValueType::Int && i32::try_from(value).is_err() {
        return Err(Report::new(Error::coercion(
            field,
            target,
            format!("{value} overflows a 32-bit integer"),
        )));
    }
    Ok(Value::Int(value))
}

#[allow(clippy::cast_possible_truncation, reason = "range checked before the cast")]
fn integral(f: f64) -> std::result::Result<i64, String> {
    if f.fract() != 0.0 || !f.is_finite() {
        return Err(format!("{f} is not a whole number"));
    }
    if f < -I64_BOUND || f >= I64_BOUND {
        return Err(format!("{f} overflows a 64-bit integer"));
    }
    Ok(f as i64)
}

pub(super) fn to_float(field: &str, token: &Token) -> Result<Value> {
    let parsed = match token {
        Token::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a number")),
        Token::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("expected a number, got {other}")),
    };
    let value = parsed.map_err(|reason| Report::new(Error::coercion(field, ValueType::Float, reason)))?;
    if !value.is_finite() || value.abs() > f64::from(f32::MAX) {
        return Err(Report::new(Error::coercion(
            field,
            ValueType::Float,
            format!("{value} is out of range"),
        )));
    }
    Ok(Value::Float(value))
}

pub(super) fn to_string(field: &str, token: &Token) -> Result<Value> {
    match token {
        Token::String(s) => Ok(Value::String(s.clone())),
        Token::Number(n) => Ok(Value::String(n.to_string())),
        Token::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(Report::new(Error::coercion(
            field,
            ValueType::String,
            format!("expected text, got {other}"),
        ))),
    }
}

/// Case-insensitive label match, or an ordinal into the declared members
pub(super) fn to_enum(field: &str, token: &Token, enum_type: &EnumType) -> Result<Value> {
    let target = || ValueType::Enum(enum_type.clone());
    match token {
        Token::String(label) => enum_type
            .variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(label.trim()))
            .map(|v| Value::Enum(v.clone()))
            .ok_or_else(|| {
                Report::new(Error::coercion(
                    field,
                    target(),
                    format!(
                        "'{label}' is not a member; valid values: {}",
                        enum_type.variants.join(", ")
                    ),
                ))
            }),
        Token::Number(n) => n
            .as_u64()
            .and_then(|ordinal| usize::try_from(ordinal).ok())
            .and_then(|ordinal| enum_type.variants.get(ordinal))
            .map(|v| Value::Enum(v.clone()))
            .ok_or_else(|| {
                Report::new(Error::coercion(
                    field,
                    target(),
                    format!("{n} is not a valid ordinal"),
                ))
            }),
        other => Err(Report::new(Error::coercion(
            field,
            target(),
            format!("expected a member name, got {other}"),
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bool_accepts_loose_forms() {
        assert_eq!(to_bool("f", &json!("Yes")).unwrap(), Value::Bool(true));
        assert_eq!(to_bool("f", &json!("off")).unwrap(), Value::Bool(false));
        assert_eq!(to_bool("f", &json!(0)).unwrap(), Value::Bool(false));
        assert!(to_bool("f", &json!("maybe")).is_err());
    }

    #[test]
    fn test_int_overflow_is_rejected() {
        let report = to_int("count", &json!(3_000_000_000_i64), &ValueType::Int).unwrap_err();
        let Error::Coercion { field, target, .. } = report.current_context() else {
            panic!("coercion error expected, got {report:?}");
        };
        assert_eq!(field, "count");
        assert_eq!(target, "Int");
        assert_eq!(
            to_int("count", &json!(3_000_000_000_i64), &ValueType::Long).unwrap(),
            Value::Int(3_000_000_000)
        );
        assert!(to_int("count", &json!(u64::MAX), &ValueType::Long).is_err());
    }

    #[test]
    fn test_int_from_whole_float_and_string() {
        assert_eq!(to_int("n", &json!(4.0), &ValueType::Int).unwrap(), Value::Int(4));
        assert_eq!(to_int("n", &json!(" 12 "), &ValueType::Int).unwrap(), Value::Int(12));
        assert!(to_int("n", &json!(4.5), &ValueType::Int).is_err());
    }

    #[test]
    fn test_float_range() {
        assert_eq!(to_float("x", &json!("2.5")).unwrap(), Value::Float(2.5));
        assert!(to_float("x", &json!(1e300)).is_err());
    }

    #[test]
    fn test_enum_is_case_insensitive() {
        let light_type = EnumType::new("Engine.LightType", &["Spot", "Directional", "Point"]);
        assert_eq!(
            to_enum("type", &json!("directional"), &light_type).unwrap(),
            Value::Enum("Directional".to_string())
        );
        assert_eq!(
            to_enum("type", &json!(2), &light_type).unwrap(),
            Value::Enum("Point".to_string())
        );
        assert!(to_enum("type", &json!("Area"), &light_type).is_err());
    }
}
