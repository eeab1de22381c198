//! Vectors, quaternions and colors

use error_stack::Report;
use serde_json::Value as Token;

use crate::constants::DEFAULT_COLOR_ALPHA;
use crate::error::{Error, Result};
use crate::model::{Value, ValueType, VectorKind};

/// Convert an array, component object, delimited string or hex color into a vector value
pub(super) fn to_vector(field: &str, token: &Token, kind: VectorKind) -> Result<Value> {
    let fail = |reason: String| Report::new(Error::coercion(field, ValueType::Vector(kind), reason));

    let components = match token {
        Token::Array(items) => items
            .iter()
            .map(component)
            .collect::<std::result::Result<Vec<f32>, String>>()
            .map_err(fail)?,
        Token::Object(map) => from_named(map, kind).map_err(fail)?,
        Token::String(s) if kind == VectorKind::Color && s.trim().starts_with('#') => {
            from_hex(s.trim()).map_err(fail)?
        },
        Token::String(s) => from_delimited(s).map_err(fail)?,
        other => return Err(fail(format!("expected an array of numbers, got {other}"))),
    };

    build(kind, &components).map_err(fail)
}

fn component(token: &Token) -> std::result::Result<f32, String> {
    match token {
        Token::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{n} is not a number"))
            .and_then(narrow),
        Token::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number"))
            .and_then(narrow),
        other => Err(format!("component {other} is not a number")),
    }
}

#[allow(clippy::cast_possible_truncation, reason = "range checked before the cast")]
fn narrow(value: f64) -> std::result::Result<f32, String> {
    if !value.is_finite() || value.abs() > f64::from(f32::MAX) {
        return Err(format!("component {value} is out of range"));
    }
    Ok(value as f32)
}

/// `{x, y, z}` or `{r, g, b, a}` objects; keys are matched case-insensitively and the alpha
/// channel of a color may be omitted
fn from_named(
    map: &serde_json::Map<String, Token>,
    kind: VectorKind,
) -> std::result::Result<Vec<f32>, String> {
    let names = kind.component_names();
    let mut components = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let found = map.iter().find(|(key, _)| key.eq_ignore_ascii_case(name));
        match found {
            Some((_, token)) => components.push(component(token)?),
            None if kind == VectorKind::Color && index == 3 => {},
            None => return Err(format!("missing component '{name}'")),
        }
    }
    Ok(components)
}

/// `"1,2,3"` or `"1 2 3"`, optionally wrapped in parentheses
fn from_delimited(text: &str) -> std::result::Result<Vec<f32>, String> {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(format!("'{text}' holds no components"));
    }
    parts
        .into_iter()
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| format!("'{part}' is not a number"))
                .and_then(narrow)
        })
        .collect()
}

/// `#RRGGBB` or `#RRGGBBAA`
fn from_hex(text: &str) -> std::result::Result<Vec<f32>, String> {
    let digits = text.trim_start_matches('#');
    if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
        return Err(format!("'{text}' is not a #RRGGBB or #RRGGBBAA color"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|start| {
            u8::from_str_radix(&digits[start..start + 2], 16)
                .map(|byte| f32::from(byte) / 255.0)
                .map_err(|_| format!("'{text}' is not a valid hex color"))
        })
        .collect()
}

fn build(kind: VectorKind, components: &[f32]) -> std::result::Result<Value, String> {
    let arity = kind.arity();
    let value = match (kind, components) {
        (VectorKind::Vec2, [x, y]) => Value::Vec2([*x, *y]),
        (VectorKind::Vec3, [x, y, z]) => Value::Vec3([*x, *y, *z]),
        (VectorKind::Vec4, [x, y, z, w]) => Value::Vec4([*x, *y, *z, *w]),
        (VectorKind::Quat, [x, y, z, w]) => Value::Quat([*x, *y, *z, *w]),
        (VectorKind::Color, [r, g, b]) => Value::Color([*r, *g, *b, DEFAULT_COLOR_ALPHA]),
        (VectorKind::Color, [r, g, b, a]) => Value::Color([*r, *g, *b, *a]),
        (VectorKind::Color, _) => {
            return Err(format!(
                "expected 3 or 4 components, got {}",
                components.len()
            ));
        },
        _ => {
            return Err(format!(
                "expected {arity} components, got {}",
                components.len()
            ));
        },
    };
    Ok(value)
}
