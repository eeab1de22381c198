//! Member-accessor registry for nested objects
//!
//! An [`Object`] is an ordered table of [`Member`] slots. Order matters: the Path Mutator
//! resolves names by [`MemberKind`] precedence first and table order second. Material-like
//! objects additionally carry [`ShaderChannels`], which are not members and are only reachable
//! through the shader sigil.

use serde_json::Map;

use super::type_name::TypeName;
use super::value::Value;
use super::value_type::ValueType;

/// Visibility tier of a member, in lookup precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    /// Public property
    Property,
    /// Public field
    Field,
    /// Non-public field flagged serializable
    HiddenField,
}

/// One slot in an object's member table
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Declared name, case preserved
    pub name:     String,
    /// Visibility tier
    pub kind:     MemberKind,
    /// Declared type
    pub declared: ValueType,
    /// False for getter-only properties
    pub writable: bool,
    /// Current value
    pub value:    Value,
}

impl Member {
    fn new(name: &str, kind: MemberKind, declared: ValueType, value: Value) -> Self {
        Self {
            name: name.to_string(),
            kind,
            declared,
            writable: true,
            value,
        }
    }

    /// Public property slot
    pub fn property(name: &str, declared: ValueType, value: impl Into<Value>) -> Self {
        Self::new(name, MemberKind::Property, declared, value.into())
    }

    /// Public field slot
    pub fn field(name: &str, declared: ValueType, value: impl Into<Value>) -> Self {
        Self::new(name, MemberKind::Field, declared, value.into())
    }

    /// Hidden serializable field slot
    pub fn hidden(name: &str, declared: ValueType, value: impl Into<Value>) -> Self {
        Self::new(name, MemberKind::HiddenField, declared, value.into())
    }

    /// Mark the slot as getter-only
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

/// A named shader parameter on a material-like object
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProperty {
    /// Parameter name including the sigil, e.g. `_Color`
    pub name:     String,
    /// Declared channel type
    pub declared: ValueType,
    /// Current value
    pub value:    Value,
}

/// Shader parameter table of a material-like object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderChannels {
    /// Shader the material uses
    pub shader:     String,
    properties: Vec<ShaderProperty>,
}

impl ShaderChannels {
    /// Empty table for the named shader
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader:     shader.into(),
            properties: Vec::new(),
        }
    }

    /// Builder: declare a channel
    #[must_use]
    pub fn with(mut self, name: &str, declared: ValueType, value: impl Into<Value>) -> Self {
        self.properties.push(ShaderProperty {
            name: name.to_string(),
            declared,
            value: value.into(),
        });
        self
    }

    /// Channel by exact name
    pub fn get(&self, name: &str) -> Option<&ShaderProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Mutable channel by exact name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ShaderProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Channel names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> { self.properties.iter().map(|p| p.name.as_str()) }

    /// All channels
    pub fn properties(&self) -> &[ShaderProperty] { &self.properties }
}

/// A nested object: type identity plus ordered member table
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    type_name: TypeName,
    members:   Vec<Member>,
    shader:    Option<ShaderChannels>,
}

impl Object {
    /// Empty object of the given type
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            members:   Vec::new(),
            shader:    None,
        }
    }

    /// Builder: append a member slot
    #[must_use]
    pub fn with(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Builder: make the object material-like
    #[must_use]
    pub fn with_shader(mut self, channels: ShaderChannels) -> Self {
        self.shader = Some(channels);
        self
    }

    /// Runtime type of the object
    pub const fn type_name(&self) -> &TypeName { &self.type_name }

    /// Member table in declaration order
    pub fn members(&self) -> &[Member] { &self.members }

    /// Slot by table index
    pub fn member_at(&self, index: usize) -> Option<&Member> { self.members.get(index) }

    /// Mutable slot by table index
    pub fn member_at_mut(&mut self, index: usize) -> Option<&mut Member> {
        self.members.get_mut(index)
    }

    /// Slot by exact, case-sensitive name
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Value of a slot by exact name
    pub fn get(&self, name: &str) -> Option<&Value> { self.member(name).map(|m| &m.value) }

    /// Whether shader-parameter writes are routed to [`ShaderChannels`]
    pub const fn is_material(&self) -> bool { self.shader.is_some() }

    /// Shader table of a material-like object
    pub const fn shader(&self) -> Option<&ShaderChannels> { self.shader.as_ref() }

    /// Mutable shader table of a material-like object
    pub const fn shader_mut(&mut self) -> Option<&mut ShaderChannels> { self.shader.as_mut() }

    /// Token form of the member table; hidden fields only when `include_hidden`
    pub fn to_json(&self, include_hidden: bool) -> Map<String, serde_json::Value> {
        let mut map: Map<String, serde_json::Value> = self
            .members
            .iter()
            .filter(|m| include_hidden || m.kind != MemberKind::HiddenField)
            .map(|m| (m.name.clone(), m.value.to_json(include_hidden)))
            .collect();
        if let Some(channels) = &self.shader {
            let properties: Map<String, serde_json::Value> = channels
                .properties()
                .iter()
                .map(|p| (p.name.clone(), p.value.to_json(include_hidden)))
                .collect();
            map.insert(
                crate::constants::RESPONSE_SHADER_PROPERTIES.to_string(),
                serde_json::Value::Object(properties),
            );
        }
        map
    }
}
