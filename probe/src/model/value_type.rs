//! Declared types of members
//!
//! Every member slot carries a [`ValueType`]. The Value Coercer converts tokens against it and
//! the Path Mutator uses it to decide whether `null` is an acceptable write.

use std::fmt;

use serde::Serialize;

use super::type_name::TypeName;
use super::value::Value;

/// Fixed-arity numeric composites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VectorKind {
    /// Two components `[x, y]`
    Vec2,
    /// Three components `[x, y, z]`
    Vec3,
    /// Four components `[x, y, z, w]`
    Vec4,
    /// Rotation `[x, y, z, w]`
    Quat,
    /// Color `[r, g, b, a]`
    Color,
}

impl VectorKind {
    /// Number of components
    pub const fn arity(self) -> usize {
        match self {
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Quat | Self::Color => 4,
        }
    }

    /// Component names in order, used for object-form tokens
    pub const fn component_names(self) -> &'static [&'static str] {
        match self {
            Self::Vec2 => &["x", "y"],
            Self::Vec3 => &["x", "y", "z"],
            Self::Vec4 | Self::Quat => &["x", "y", "z", "w"],
            Self::Color => &["r", "g", "b", "a"],
        }
    }

    /// Zero value; quaternions default to identity
    pub fn zero(self) -> Value {
        match self {
            Self::Vec2 => Value::Vec2([0.0; 2]),
            Self::Vec3 => Value::Vec3([0.0; 3]),
            Self::Vec4 => Value::Vec4([0.0; 4]),
            Self::Quat => Value::Quat([0.0, 0.0, 0.0, 1.0]),
            Self::Color => Value::Color([0.0; 4]),
        }
    }
}

/// An enum type and its member labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumType {
    /// Fully-qualified enum name
    pub name:     TypeName,
    /// Member labels in declaration order
    pub variants: Vec<String>,
}

impl EnumType {
    /// Create an enum type
    pub fn new(name: impl Into<TypeName>, variants: &[&str]) -> Self {
        Self {
            name:     name.into(),
            variants: variants.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Declared type of a member, list element or shader channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    /// `true` / `false`
    Bool,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Floating point number
    Float,
    /// Text
    String,
    /// Enumeration
    Enum(EnumType),
    /// Fixed-arity numeric composite
    Vector(VectorKind),
    /// Handle to a managed asset of the given type
    Resource(TypeName),
    /// Growable list
    List(Box<Self>),
    /// Fixed-length collection
    Array(Box<Self>, usize),
    /// Nested value object, never null
    Struct(TypeName),
    /// Nested reference object, may be null
    Reference(TypeName),
    /// Any type wrapped to accept absence
    Nullable(Box<Self>),
    /// A type the core has no converter for
    Opaque(TypeName),
}

impl ValueType {
    /// Whether `null` is a legal value for this type
    pub const fn accepts_absence(&self) -> bool {
        matches!(
            self,
            Self::Resource(_) | Self::Reference(_) | Self::Nullable(_) | Self::Opaque(_)
        )
    }

    /// Element type of a list or array
    pub fn element_type(&self) -> Option<&Self> {
        match self {
            Self::List(element) | Self::Array(element, _) => Some(element),
            Self::Nullable(inner) => inner.element_type(),
            _ => None,
        }
    }

    /// Zero value of a non-nullable type, `None` when the template has to come from the host
    pub fn zero_value(&self) -> Option<Value> {
        let zero = match self {
            Self::Bool => Value::Bool(false),
            Self::Int | Self::Long => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Enum(enum_type) => Value::Enum(enum_type.variants.first()?.clone()),
            Self::Vector(kind) => kind.zero(),
            Self::List(_) => Value::List(Vec::new()),
            Self::Array(element, len) => {
                let element_zero = element.zero_value().unwrap_or(Value::Null);
                Value::List(vec![element_zero; *len])
            },
            Self::Resource(_) | Self::Reference(_) | Self::Nullable(_) | Self::Opaque(_) => {
                Value::Null
            },
            Self::Struct(_) => return None,
        };
        Some(zero)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "Bool"),
            Self::Int => write!(f, "Int"),
            Self::Long => write!(f, "Long"),
            Self::Float => write!(f, "Float"),
            Self::String => write!(f, "String"),
            Self::Enum(enum_type) => write!(f, "enum {}", enum_type.name),
            Self::Vector(kind) => write!(f, "{kind:?}"),
            Self::Resource(name) => write!(f, "resource {name}"),
            Self::List(element) => write!(f, "List<{element}>"),
            Self::Array(element, len) => write!(f, "[{element}; {len}]"),
            Self::Struct(name) | Self::Reference(name) | Self::Opaque(name) => {
                write!(f, "{}", name.short_name())
            },
            Self::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}
