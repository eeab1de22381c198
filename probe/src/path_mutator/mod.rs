//! Apply and read dotted, indexed member paths on nested objects
//!
//! ## Traversal
//!
//! Every non-final segment resolves a member (see [`member_lookup`]), applies its indices and must
//! land on a non-null nested object. At the final segment:
//!
//! - on a material-like object, a name starting with the shader sigil addresses a shader channel
//! - otherwise the member (or the indexed element) is coerced against its declared type and
//!   written; `null` is only stored where the declared type accepts absence
//!
//! Coercion failures keep their own kind; everything else is an [`Error::Path`].

pub(crate) mod member_lookup;
mod path_parser;
mod shader;

use error_stack::Report;
pub use path_parser::{PathExpression, PathSegment, parse_path};
use serde_json::Value as Token;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Object, Value, ValueType};
use crate::value_coercer::ValueCoercer;

/// Path-based reads and writes against one object graph
pub struct PathMutator<'a> {
    coercer:      ValueCoercer<'a>,
    shader_sigil: &'a str,
}

impl<'a> PathMutator<'a> {
    /// Create a mutator; `shader_sigil` prefixes shader channel names
    pub const fn new(coercer: ValueCoercer<'a>, shader_sigil: &'a str) -> Self {
        Self {
            coercer,
            shader_sigil,
        }
    }

    /// Coerce `token` and write it at `path` under `root`
    pub fn apply_path(&self, root: &mut Object, path: &str, token: &Token) -> Result<()> {
        let expression = parse_path(path)?;
        let Some((last, parents)) = expression.split_last() else {
            return Err(Report::new(Error::path(path, "path is empty")));
        };

        let mut current = root;
        for segment in parents {
            current = descend_mut(current, path, segment)?;
        }

        if last.indices.is_empty() && self.is_shader_channel(current, &last.name) {
            debug!("'{path}' routed to shader channel '{}'", last.name);
            return shader::set_channel(&self.coercer, current, path, &last.name, token);
        }

        let index = lookup(current, path, &last.name)?;
        let type_name = current.type_name().clone();
        let Some(member) = current.member_at_mut(index) else {
            return Err(Report::new(Error::path(path, "member table changed")));
        };

        if !member.writable {
            return Err(Report::new(Error::path(
                path,
                format!("member '{}' on {type_name} is read-only", member.name),
            )));
        }

        if last.indices.is_empty() {
            let value = self
                .coercer
                .coerce(path, token, &member.declared, Some(&member.value))?;
            store(path, &member.declared, &mut member.value, value)?;
            return Ok(());
        }

        let mut declared = member.declared.clone();
        let mut slot = &mut member.value;
        for &position in &last.indices {
            declared = declared.element_type().cloned().ok_or_else(|| {
                Report::new(Error::path(
                    path,
                    format!("'{last}' indexes {declared}, which is not a list"),
                ))
            })?;
            slot = index_mut(slot, path, last, position)?;
        }
        let value = self.coercer.coerce(path, token, &declared, Some(&*slot))?;
        store(path, &declared, slot, value)
    }

    /// Current value at `path` under `root`
    pub fn read_path(&self, root: &Object, path: &str) -> Result<Value> {
        let expression = parse_path(path)?;
        let Some((last, parents)) = expression.split_last() else {
            return Err(Report::new(Error::path(path, "path is empty")));
        };

        let mut current = root;
        for segment in parents {
            current = descend(current, path, segment)?;
        }

        if last.indices.is_empty() && self.is_shader_channel(current, &last.name) {
            return shader::read_channel(current, path, &last.name);
        }

        let index = lookup(current, path, &last.name)?;
        let Some(member) = current.member_at(index) else {
            return Err(Report::new(Error::path(path, "member table changed")));
        };
        let mut slot = &member.value;
        for &position in &last.indices {
            slot = index_ref(slot, path, last, position)?;
        }
        Ok(slot.clone())
    }

    fn is_shader_channel(&self, object: &Object, name: &str) -> bool {
        object.is_material() && !self.shader_sigil.is_empty() && name.starts_with(self.shader_sigil)
    }
}

fn lookup(object: &Object, path: &str, name: &str) -> Result<usize> {
    member_lookup::resolve_member(object, name).map_err(|failure| {
        Report::new(Error::path(
            path,
            format!("{} on {}", failure.reason(name), object.type_name()),
        ))
    })
}

/// Write a coerced value, refusing absence where the declared type does not accept it
fn store(path: &str, declared: &ValueType, slot: &mut Value, value: Value) -> Result<()> {
    if value.is_null() && !declared.accepts_absence() {
        return Err(Report::new(Error::path(
            path,
            format!("{declared} does not accept null"),
        )));
    }
    *slot = value;
    Ok(())
}

fn descend_mut<'o>(object: &'o mut Object, path: &str, segment: &PathSegment) -> Result<&'o mut Object> {
    let index = lookup(object, path, &segment.name)?;
    let Some(member) = object.member_at_mut(index) else {
        return Err(Report::new(Error::path(path, "member table changed")));
    };
    let mut slot = &mut member.value;
    for &position in &segment.indices {
        slot = index_mut(slot, path, segment, position)?;
    }
    match slot {
        Value::Object(nested) => Ok(&mut **nested),
        Value::Null => Err(Report::new(Error::path(path, format!("'{segment}' is null")))),
        other => Err(Report::new(Error::path(
            path,
            format!("'{segment}' is a {}, not an object", other.shape()),
        ))),
    }
}

fn descend<'o>(object: &'o Object, path: &str, segment: &PathSegment) -> Result<&'o Object> {
    let index = lookup(object, path, &segment.name)?;
    let Some(member) = object.member_at(index) else {
        return Err(Report::new(Error::path(path, "member table changed")));
    };
    let mut slot = &member.value;
    for &position in &segment.indices {
        slot = index_ref(slot, path, segment, position)?;
    }
    match slot {
        Value::Object(nested) => Ok(&**nested),
        Value::Null => Err(Report::new(Error::path(path, format!("'{segment}' is null")))),
        other => Err(Report::new(Error::path(
            path,
            format!("'{segment}' is a {}, not an object", other.shape()),
        ))),
    }
}

fn index_mut<'v>(
    slot: &'v mut Value,
    path: &str,
    segment: &PathSegment,
    position: usize,
) -> Result<&'v mut Value> {
    match slot {
        Value::List(items) => {
            let len = items.len();
            items.get_mut(position).ok_or_else(|| {
                Report::new(Error::path(
                    path,
                    format!(
                        "index {position} is out of bounds for '{}' (length {len})",
                        segment.name
                    ),
                ))
            })
        },
        Value::Null => Err(Report::new(Error::path(
            path,
            format!("'{}' is null", segment.name),
        ))),
        other => Err(Report::new(Error::path(
            path,
            format!("'{}' is a {}, not a list", segment.name, other.shape()),
        ))),
    }
}

fn index_ref<'v>(
    slot: &'v Value,
    path: &str,
    segment: &PathSegment,
    position: usize,
) -> Result<&'v Value> {
    match slot {
        Value::List(items) => items.get(position).ok_or_else(|| {
            Report::new(Error::path(
                path,
                format!(
                    "index {position} is out of bounds for '{}' (length {})",
                    segment.name,
                    items.len()
                ),
            ))
        }),
        Value::Null => Err(Report::new(Error::path(
            path,
            format!("'{}' is null", segment.name),
        ))),
        other => Err(Report::new(Error::path(
            path,
            format!("'{}' is a {}, not a list", segment.name, other.shape()),
        ))),
    }
}
