//! Strongly-typed member values
//!
//! [`Value`] is what a member slot holds after coercion. `to_json` produces the token shape the
//! Value Coercer accepts back, so a read followed by a write of the same token is a no-op.

use serde::Serialize;
use serde_json::json;

use super::object::Object;
use super::type_name::TypeName;

/// Handle to a managed asset owned by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceHandle {
    /// Host path of the asset, e.g. `Assets/Textures/Grass.png`
    pub path:      String,
    /// Display name of the asset
    pub name:      String,
    /// Asset type
    pub type_name: TypeName,
}

impl ResourceHandle {
    /// Create a handle whose name is the file stem of `path`
    pub fn new(path: impl Into<String>, type_name: impl Into<TypeName>) -> Self {
        let path = path.into();
        let file = path.rsplit('/').next().unwrap_or(&path);
        let name = file.split('.').next().unwrap_or(file).to_string();
        Self {
            path,
            name,
            type_name: type_name.into(),
        }
    }
}

/// A value held by a member slot, list element or shader channel
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence (null reference or missing handle)
    Null,
    /// Boolean
    Bool(bool),
    /// Integer of any declared width
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Enum member label
    Enum(String),
    /// Two-component vector
    Vec2([f32; 2]),
    /// Three-component vector
    Vec3([f32; 3]),
    /// Four-component vector
    Vec4([f32; 4]),
    /// Rotation quaternion `[x, y, z, w]`
    Quat([f32; 4]),
    /// Color `[r, g, b, a]`
    Color([f32; 4]),
    /// Asset handle
    Resource(ResourceHandle),
    /// List or fixed array
    List(Vec<Self>),
    /// Nested object
    Object(Box<Object>),
}

impl Value {
    /// Wrap an object
    pub fn object(object: Object) -> Self { Self::Object(Box::new(object)) }

    /// True for [`Value::Null`]
    pub const fn is_null(&self) -> bool { matches!(self, Self::Null) }

    /// Borrow the nested object, if this is one
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Mutably borrow the nested object, if this is one
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Numeric components of a vector-like value
    pub fn components(&self) -> Option<&[f32]> {
        match self {
            Self::Vec2(v) => Some(v.as_slice()),
            Self::Vec3(v) => Some(v.as_slice()),
            Self::Vec4(v) | Self::Quat(v) | Self::Color(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Short label of the value's shape, for error messages
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Vec2(_) => "Vec2",
            Self::Vec3(_) => "Vec3",
            Self::Vec4(_) => "Vec4",
            Self::Quat(_) => "Quat",
            Self::Color(_) => "Color",
            Self::Resource(_) => "resource",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// Token form of the value
    pub fn to_json(&self, include_hidden: bool) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => json!(b),
            Self::Int(i) => json!(i),
            Self::Float(f) => json!(f),
            Self::String(s) | Self::Enum(s) => json!(s),
            Self::Vec2(v) => json!(v),
            Self::Vec3(v) => json!(v),
            Self::Vec4(v) | Self::Quat(v) | Self::Color(v) => json!(v),
            Self::Resource(handle) => json!(handle.path),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json(include_hidden))
                    .collect(),
            ),
            Self::Object(object) => serde_json::Value::Object(object.to_json(include_hidden)),
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self { Self::object(object) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_handle_name_from_path() {
        let handle = ResourceHandle::new("Assets/Textures/Grass.png", "Engine.Texture2D");
        assert_eq!(handle.name, "Grass");
        assert_eq!(handle.type_name.short_name(), "Texture2D");
    }

    #[test]
    fn test_token_shapes() {
        assert_eq!(Value::Vec3([1.0, 2.0, 3.0]).to_json(true), json!([1.0, 2.0, 3.0]));
        assert_eq!(Value::Enum("Spot".into()).to_json(true), json!("Spot"));
        assert_eq!(
            Value::Resource(ResourceHandle::new("Assets/Mat.mat", "Engine.Material")).to_json(true),
            json!("Assets/Mat.mat")
        );
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Null]).to_json(true),
            json!([1, null])
        );
    }
}
