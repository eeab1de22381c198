//! Entity and capability records as exposed by the host

use serde::{Deserialize, Serialize};

use super::object::Object;
use super::type_name::TypeDescriptor;

/// Stable identity of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Stable identity of an attached capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(pub i64);

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// A typed unit of state attached to exactly one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    /// Identity of this attachment
    pub id:         CapabilityId,
    /// Resolved type
    pub descriptor: TypeDescriptor,
    /// Member table
    pub state:      Object,
}

/// A node in the live graph
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Stable identity
    pub id:           EntityId,
    /// Display name
    pub name:         String,
    /// Tag label
    pub tag:          String,
    /// Layer index
    pub layer:        u32,
    /// Own active flag; effective activity also depends on ancestors
    pub active_self:  bool,
    /// Parent entity, `None` for roots
    pub parent:       Option<EntityId>,
    /// Attached capabilities in attachment order
    pub capabilities: Vec<Capability>,
}

impl Entity {
    /// First capability whose type has the given fully-qualified name
    pub fn capability(&self, full_name: &str) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|c| c.descriptor.full_name.as_str() == full_name)
    }

    /// Mutable variant of [`Entity::capability`]
    pub fn capability_mut(&mut self, full_name: &str) -> Option<&mut Capability> {
        self.capabilities
            .iter_mut()
            .find(|c| c.descriptor.full_name.as_str() == full_name)
    }

    /// Capability by attachment identity
    pub fn capability_by_id_mut(&mut self, id: CapabilityId) -> Option<&mut Capability> {
        self.capabilities.iter_mut().find(|c| c.id == id)
    }

    /// Whether any attached capability has the given fully-qualified type name
    pub fn has_capability(&self, full_name: &str) -> bool { self.capability(full_name).is_some() }
}
