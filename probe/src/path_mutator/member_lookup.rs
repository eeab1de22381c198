//! Case-insensitive member resolution with precedence
//!
//! Members are matched ignoring case. When several slots match:
//!
//! - an exact-case match wins, property before field before hidden field; the collision with the
//!   differently-cased slots is logged
//! - otherwise the name is ambiguous and the caller must spell it exactly

use tracing::warn;

use crate::model::{Member, Object};
use crate::suggest;

/// Why a name did not resolve to a single member
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LookupFailure {
    /// No member matches, with close names
    Missing { suggestions: Vec<String> },
    /// Several members match ignoring case and none matches exactly
    Ambiguous { candidates: Vec<String> },
}

impl LookupFailure {
    /// Human readable reason for `name`
    pub(crate) fn reason(&self, name: &str) -> String {
        match self {
            Self::Missing { suggestions } if suggestions.is_empty() => {
                format!("no member named '{name}'")
            },
            Self::Missing { suggestions } => format!(
                "no member named '{name}'. Did you mean: {}?",
                suggestions.join(", ")
            ),
            Self::Ambiguous { candidates } => format!(
                "'{name}' matches {} ignoring case; use the exact name",
                candidates.join(", ")
            ),
        }
    }
}

/// Table index of the member `name` resolves to
pub(crate) fn resolve_member(object: &Object, name: &str) -> Result<usize, LookupFailure> {
    let matches: Vec<(usize, &Member)> = object
        .members()
        .iter()
        .enumerate()
        .filter(|(_, member)| member.name.eq_ignore_ascii_case(name))
        .collect();

    if let Some((index, exact)) = matches
        .iter()
        .filter(|(_, member)| member.name == name)
        .min_by_key(|(_, member)| member.kind)
    {
        if matches.len() > 1 {
            warn!(
                "member '{name}' on {} collides with {} other slot(s) ignoring case; using the {:?} with the exact name",
                object.type_name(),
                matches.len() - 1,
                exact.kind
            );
        }
        return Ok(*index);
    }

    match matches.as_slice() {
        [] => Err(LookupFailure::Missing {
            suggestions: suggest::closest(
                name,
                object.members().iter().map(|member| member.name.as_str()),
            ),
        }),
        [(index, _)] => Ok(*index),
        several => Err(LookupFailure::Ambiguous {
            candidates: several
                .iter()
                .map(|(_, member)| member.name.clone())
                .collect(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Value, ValueType};

    fn collider() -> Object {
        Object::new("Engine.Collider")
            .with(Member::field("center", ValueType::Float, Value::Float(0.0)))
            .with(Member::hidden("Radius", ValueType::Float, Value::Float(1.0)))
            .with(Member::property("radius", ValueType::Float, Value::Float(1.0)))
            .with(Member::field("Size", ValueType::Float, Value::Float(1.0)))
            .with(Member::hidden("size", ValueType::Float, Value::Float(1.0)))
    }

    #[test]
    fn test_case_insensitive_single_match() {
        assert_eq!(resolve_member(&collider(), "CENTER"), Ok(0));
    }

    #[test]
    fn test_exact_case_wins_collision() {
        let object = collider();
        assert_eq!(resolve_member(&object, "radius"), Ok(2));
        assert_eq!(resolve_member(&object, "Radius"), Ok(1));
        assert_eq!(resolve_member(&object, "size"), Ok(4));
    }

    #[test]
    fn test_inexact_collision_is_ambiguous() {
        let failure = resolve_member(&collider(), "RADIUS").unwrap_err();
        assert_eq!(
            failure,
            LookupFailure::Ambiguous {
                candidates: vec!["Radius".to_string(), "radius".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_member_suggests() {
        let failure = resolve_member(&collider(), "centre").unwrap_err();
        assert!(failure.reason("centre").contains("Did you mean: center"));
    }
}
