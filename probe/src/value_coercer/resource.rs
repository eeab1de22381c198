//! Asset handles
//!
//! A resource token is a path string or `{ "path": ... }`. A path that does not resolve is not an
//! error: the write clears the slot, matching how the host treats a missing asset reference.

use error_stack::Report;
use serde_json::Value as Token;
use tracing::{debug, warn};

use crate::constants::TOKEN_RESOURCE_PATH;
use crate::error::{Error, Result};
use crate::host::ResourceLookup;
use crate::model::{TypeName, Value, ValueType};

/// Resolve a resource token to a handle, or to [`Value::Null`] when nothing matches
pub(super) fn to_resource(
    lookup: &dyn ResourceLookup,
    field: &str,
    token: &Token,
    expected: &TypeName,
) -> Result<Value> {
    let raw = match token {
        Token::String(s) => s.as_str(),
        Token::Object(map) => map
            .get(TOKEN_RESOURCE_PATH)
            .and_then(Token::as_str)
            .ok_or_else(|| {
                Report::new(Error::coercion(
                    field,
                    ValueType::Resource(expected.clone()),
                    format!("object token needs a string '{TOKEN_RESOURCE_PATH}'"),
                ))
            })?,
        other => {
            return Err(Report::new(Error::coercion(
                field,
                ValueType::Resource(expected.clone()),
                format!("expected a path, got {other}"),
            )));
        },
    };

    let path = normalize_path(raw);
    if path.is_empty() {
        return Ok(Value::Null);
    }

    if let Some(handle) = lookup.load_by_path(&path, expected) {
        debug!("resource '{path}' loaded for '{field}'");
        return Ok(Value::Resource(handle));
    }

    if !path.contains('/') {
        let mut matches = lookup.search_by_type_and_name(expected, &path);
        match matches.len() {
            1 => return Ok(Value::Resource(matches.remove(0))),
            0 => {},
            count => {
                warn!(
                    "resource name '{path}' matches {count} {expected} assets; leaving '{field}' empty"
                );
                return Ok(Value::Null);
            },
        }
    }

    warn!("resource '{path}' ({expected}) not found; leaving '{field}' empty");
    Ok(Value::Null)
}

/// Forward slashes only, no `file://` scheme, no leading separator
fn normalize_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let without_scheme = unified.strip_prefix("file://").unwrap_or(&unified);
    without_scheme.trim_start_matches('/').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryResources;
    use crate::model::ResourceHandle;

    fn resources() -> MemoryResources {
        MemoryResources::new()
            .with(ResourceHandle::new("Assets/Materials/Red.mat", "Engine.Material"))
            .with(ResourceHandle::new("Assets/Materials/Blue.mat", "Engine.Material"))
            .with(ResourceHandle::new("Assets/Alt/Blue.mat", "Engine.Material"))
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("file:///Assets\\A.png"), "Assets/A.png");
        assert_eq!(normalize_path(" /Assets/A.png "), "Assets/A.png");
    }

    #[test]
    fn test_path_and_object_tokens_load() {
        let lookup = resources();
        let material: TypeName = "Engine.Material".into();

        let by_path = to_resource(&lookup, "mat", &json!("Assets\\Materials\\Red.mat"), &material)
            .unwrap();
        assert!(matches!(by_path, Value::Resource(ref h) if h.name == "Red"));

        let by_object = to_resource(
            &lookup,
            "mat",
            &json!({ "path": "Assets/Materials/Red.mat" }),
            &material,
        )
        .unwrap();
        assert_eq!(by_path, by_object);
    }

    #[test]
    fn test_missing_resource_is_null_not_error() {
        let lookup = resources();
        let material: TypeName = "Engine.Material".into();
        assert_eq!(
            to_resource(&lookup, "mat", &json!("Assets/Nope.mat"), &material).unwrap(),
            Value::Null
        );
        assert_eq!(
            to_resource(&lookup, "mat", &json!("Red.mat"), &"Engine.Texture2D".into()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_bare_name_searches_when_unique() {
        let lookup = resources();
        let material: TypeName = "Engine.Material".into();
        assert!(matches!(
            to_resource(&lookup, "mat", &json!("Red"), &material).unwrap(),
            Value::Resource(_)
        ));
        assert_eq!(
            to_resource(&lookup, "mat", &json!("Blue"), &material).unwrap(),
            Value::Null
        );
    }
}
