//! Shader parameter access on material-like objects
//!
//! Shader channels are looked up by exact name; the sigil is part of the name.

use error_stack::Report;
use serde_json::Value as Token;

use crate::error::{Error, Result};
use crate::model::{Object, Value};
use crate::suggest;
use crate::value_coercer::ValueCoercer;

fn unknown_channel(object: &Object, path: &str, name: &str) -> Report<Error> {
    let known: Vec<&str> = object
        .shader()
        .map(|channels| channels.names().collect())
        .unwrap_or_default();
    let shader = object.shader().map_or("", |channels| channels.shader.as_str());
    let suggestions = suggest::closest(name, known);
    let reason = if suggestions.is_empty() {
        format!("shader '{shader}' has no property '{name}'")
    } else {
        format!(
            "shader '{shader}' has no property '{name}'. Did you mean: {}?",
            suggestions.join(", ")
        )
    };
    Report::new(Error::path(path, reason))
}

/// Coerce `token` against the channel's declared type and store it
pub(super) fn set_channel(
    coercer: &ValueCoercer<'_>,
    object: &mut Object,
    path: &str,
    name: &str,
    token: &Token,
) -> Result<()> {
    let Some(channel) = object.shader_mut().and_then(|channels| channels.get_mut(name)) else {
        return Err(unknown_channel(object, path, name));
    };
    channel.value = coercer.coerce(path, token, &channel.declared, Some(&channel.value))?;
    Ok(())
}

/// Current value of a channel
pub(super) fn read_channel(object: &Object, path: &str, name: &str) -> Result<Value> {
    object
        .shader()
        .and_then(|channels| channels.get(name))
        .map(|channel| channel.value.clone())
        .ok_or_else(|| unknown_channel(object, path, name))
}
