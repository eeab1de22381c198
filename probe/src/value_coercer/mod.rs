//! Convert untyped value tokens into strongly-typed [`Value`]s
//!
//! The coercer dispatches on the declared [`ValueType`] of the slot being written:
//!
//! - scalars and enums convert directly ([`scalar`])
//! - vectors, quaternions and colors accept arrays, component objects and delimited strings
//!   ([`composite`])
//! - resources go through the host's [`ResourceLookup`] ([`resource`])
//! - lists, arrays and nested objects are converted structurally, member by member, starting
//!   from the slot's current value or the host's default template
//!
//! A JSON document passed as a string (`"[1,2,3]"`) is parsed before a composite conversion.
//! `null` becomes absence for types that accept it and the zero value for everything else.

mod composite;
mod resource;
mod scalar;

use std::borrow::Cow;

use error_stack::Report;
use serde_json::Value as Token;

use crate::error::{Error, Result};
use crate::host::{ResourceLookup, TypeCatalog};
use crate::model::{Object, TypeName, Value, ValueType};
use crate::path_mutator::member_lookup;

/// Token-to-value conversion against declared types
#[derive(Clone, Copy)]
pub struct ValueCoercer<'a> {
    resources: &'a dyn ResourceLookup,
    catalog:   &'a dyn TypeCatalog,
}

impl<'a> ValueCoercer<'a> {
    /// Create a coercer over the host's asset lookup and type templates
    pub fn new(resources: &'a dyn ResourceLookup, catalog: &'a dyn TypeCatalog) -> Self {
        Self { resources, catalog }
    }

    /// Convert `token` for the slot `field` declared as `target`
    ///
    /// `current` is the slot's present value; nested objects merge into it so that a partial
    /// object token only changes the members it names.
    pub fn coerce(
        &self,
        field: &str,
        token: &Token,
        target: &ValueType,
        current: Option<&Value>,
    ) -> Result<Value> {
        if token.is_null() {
            return self.absent(field, target);
        }

        match target {
            ValueType::Nullable(inner) => self.coerce(field, token, inner, current),
            ValueType::Bool => scalar::to_bool(field, token),
            ValueType::Int | ValueType::Long => scalar::to_int(field, token, target),
            ValueType::Float => scalar::to_float(field, token),
            ValueType::String => scalar::to_string(field, token),
            ValueType::Enum(enum_type) => scalar::to_enum(field, token, enum_type),
            ValueType::Vector(kind) => composite::to_vector(field, &parse_embedded(token), *kind),
            ValueType::Resource(expected) => {
                resource::to_resource(self.resources, field, token, expected)
            },
            ValueType::List(element) => {
                self.coerce_list(field, &parse_embedded(token), target, element, None, current)
            },
            ValueType::Array(element, len) => self.coerce_list(
                field,
                &parse_embedded(token),
                target,
                element,
                Some(*len),
                current,
            ),
            ValueType::Struct(type_name) | ValueType::Reference(type_name) => {
                self.coerce_object(field, &parse_embedded(token), target, type_name, current)
            },
            ValueType::Opaque(_) => Err(Report::new(Error::coercion(
                field,
                target,
                "no converter exists for this type",
            ))),
        }
    }

    /// Value written for a `null` token
    fn absent(&self, field: &str, target: &ValueType) -> Result<Value> {
        if target.accepts_absence() {
            return Ok(Value::Null);
        }
        if let Some(zero) = target.zero_value() {
            return Ok(zero);
        }
        match target {
            ValueType::Struct(type_name) => self
                .catalog
                .instantiate(type_name)
                .map(Value::object)
                .ok_or_else(|| {
                    Report::new(Error::coercion(
                        field,
                        target,
                        "null is not allowed and the type has no default",
                    ))
                }),
            _ => Err(Report::new(Error::coercion(field, target, "null is not allowed"))),
        }
    }

    fn coerce_list(
        &self,
        field: &str,
        token: &Token,
        target: &ValueType,
        element: &ValueType,
        fixed_len: Option<usize>,
        current: Option<&Value>,
    ) -> Result<Value> {
        let Token::Array(items) = token else {
            return Err(Report::new(Error::coercion(
                field,
                target,
                format!("expected an array, got {token}"),
            )));
        };
        if let Some(len) = fixed_len
            && items.len() != len
        {
            return Err(Report::new(Error::coercion(
                field,
                target,
                format!("expected {len} elements, got {}", items.len()),
            )));
        }

        let existing = match current {
            Some(Value::List(existing)) => existing.as_slice(),
            _ => &[],
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.coerce(
                    &format!("{field}[{index}]"),
                    item,
                    element,
                    existing.get(index),
                )
            })
            .collect::<Result<Vec<Value>>>()
            .map(Value::List)
    }

    /// Structural conversion: merge an object token into the current object or a template
    fn coerce_object(
        &self,
        field: &str,
        token: &Token,
        target: &ValueType,
        type_name: &TypeName,
        current: Option<&Value>,
    ) -> Result<Value> {
        let Token::Object(entries) = token else {
            return Err(Report::new(Error::coercion(
                field,
                target,
                format!("expected an object, got {token}"),
            )));
        };

        let mut object = self.base_object(field, target, type_name, current)?;
        for (key, sub_token) in entries {
            let index = member_lookup::resolve_member(&object, key).map_err(|failure| {
                Report::new(Error::coercion(field, target, failure.reason(key)))
            })?;
            let Some(member) = object.member_at(index) else {
                continue;
            };
            if !member.writable {
                return Err(Report::new(Error::coercion(
                    field,
                    target,
                    format!("member '{}' is read-only", member.name),
                )));
            }
            let nested = format!("{field}.{}", member.name);
            let value = self.coerce(&nested, sub_token, &member.declared, Some(&member.value))?;
            if let Some(slot) = object.member_at_mut(index) {
                slot.value = value;
            }
        }
        Ok(Value::object(object))
    }

    fn base_object(
        &self,
        field: &str,
        target: &ValueType,
        type_name: &TypeName,
        current: Option<&Value>,
    ) -> Result<Object> {
        if let Some(existing) = current.and_then(Value::as_object)
            && existing.type_name() == type_name
        {
            return Ok(existing.clone());
        }
        self.catalog.instantiate(type_name).ok_or_else(|| {
            Report::new(Error::coercion(
                field,
                target,
                "the host has no template for this type",
            ))
        })
    }
}

/// Parse a string that holds a JSON array or object; anything else passes through unchanged
fn parse_embedded(token: &Token) -> Cow<'_, Token> {
    if let Token::String(text) = token {
        let trimmed = text.trim();
        if (trimmed.starts_with('[') || trimmed.starts_with('{'))
            && let Ok(parsed) = serde_json::from_str::<Token>(trimmed)
        {
            return Cow::Owned(parsed);
        }
    }
    Cow::Borrowed(token)
}
