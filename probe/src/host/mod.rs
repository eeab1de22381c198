//! Collaborator contracts the core consumes from the host application
//!
//! The core never owns entities. Everything it knows about the live graph, the type universe
//! and managed assets comes through these traits, bundled per call in [`Host`].
//!
//! ## Threading
//!
//! Implementations are called from one thread only: the one that owns the graph. Hosts that
//! embed the core elsewhere must serialize access themselves.

use thiserror::Error;

use crate::model::{
    CapabilityId, Entity, EntityId, ModuleOrigin, Object, ResourceHandle, TypeCategory,
    TypeDescriptor, TypeName,
};

/// Refusal reported by a host for a structural request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Create a host error from any message
    pub fn new(message: impl Into<String>) -> Self { Self(message.into()) }
}

/// Read access to the live graph plus structural change requests
pub trait EntityStore {
    /// Every entity in enumeration order; inactive ones only when asked
    fn all_entities(&self, include_inactive: bool) -> Vec<EntityId>;

    /// Direct children in sibling order; inactive ones only when asked
    fn children_of(&self, entity: EntityId, include_inactive: bool) -> Vec<EntityId>;

    /// Resolve a `/`-separated name path, relative to `scope_root` when given
    fn find_by_hierarchy_path(&self, path: &str, scope_root: Option<EntityId>) -> Option<EntityId>;

    /// Borrow an entity record
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Mutably borrow an entity record
    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity>;

    /// Parent of an entity, `None` for roots and unknown ids
    fn parent_of(&self, id: EntityId) -> Option<EntityId> { self.entity(id).and_then(|e| e.parent) }

    /// Whether the entity and all of its ancestors are active
    fn is_active_in_hierarchy(&self, id: EntityId) -> bool;

    /// Layer index for a layer name
    fn layer_by_name(&self, name: &str) -> Option<u32>;

    /// Create an empty entity, optionally under a parent
    fn create_entity(&mut self, name: &str, parent: Option<EntityId>) -> Result<EntityId, HostError>;

    /// Destroy an entity and its whole subtree
    fn destroy_entity(&mut self, id: EntityId) -> Result<(), HostError>;

    /// Deep-copy an entity and its subtree under the same parent, with a new name
    fn duplicate_entity(&mut self, id: EntityId, name: &str) -> Result<EntityId, HostError>;

    /// Move an entity under a new parent, or to the root when `None`
    fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), HostError>;

    /// Attach a capability with the given initial state
    fn add_capability(
        &mut self,
        id: EntityId,
        descriptor: TypeDescriptor,
        state: Object,
    ) -> Result<CapabilityId, HostError>;

    /// Detach a capability
    fn remove_capability(&mut self, id: EntityId, capability: CapabilityId) -> Result<(), HostError>;
}

/// The host's type universe
pub trait TypeCatalog {
    /// Direct lookup by fully-qualified name
    fn lookup_qualified(&self, full_name: &str) -> Option<TypeDescriptor>;

    /// Every type assignable to `category`, in catalog order
    fn types_in_category(&self, category: TypeCategory) -> Vec<TypeDescriptor>;

    /// Partition a module belongs to
    fn module_origin(&self, module: &str) -> ModuleOrigin;

    /// Default state for a type; capability factory and structural-conversion template
    fn instantiate(&self, type_name: &TypeName) -> Option<Object>;
}

/// Managed asset lookup
pub trait ResourceLookup {
    /// Load the asset at `path` if it exists and has the expected type
    fn load_by_path(&self, path: &str, expected: &TypeName) -> Option<ResourceHandle>;

    /// Every asset of the type whose name equals `name`
    fn search_by_type_and_name(&self, expected: &TypeName, name: &str) -> Vec<ResourceHandle>;
}

/// What a mutation notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    /// The entity record itself (name, tag, layer, parent, activity)
    Entity(EntityId),
    /// One attached capability
    Capability {
        /// Owning entity
        entity:     EntityId,
        /// The capability
        capability: CapabilityId,
    },
}

/// Undo / dirty-marking hook
pub trait MutationObserver {
    /// An entity was created
    fn notify_created(&mut self, entity: EntityId);

    /// An entity or capability changed
    fn notify_mutated(&mut self, target: MutationTarget);

    /// An entity was destroyed
    fn notify_destroyed(&mut self, entity: EntityId);
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MutationObserver for NoopObserver {
    fn notify_created(&mut self, _entity: EntityId) {}

    fn notify_mutated(&mut self, _target: MutationTarget) {}

    fn notify_destroyed(&mut self, _entity: EntityId) {}
}

/// Borrowed collaborators for one façade call
pub struct Host<'h> {
    /// Live graph
    pub store:     &'h mut dyn EntityStore,
    /// Type universe
    pub catalog:   &'h dyn TypeCatalog,
    /// Managed assets
    pub resources: &'h dyn ResourceLookup,
    /// Mutation notifications
    pub observer:  &'h mut dyn MutationObserver,
}

impl<'h> Host<'h> {
    /// Bundle the collaborators
    pub fn new(
        store: &'h mut dyn EntityStore,
        catalog: &'h dyn TypeCatalog,
        resources: &'h dyn ResourceLookup,
        observer: &'h mut dyn MutationObserver,
    ) -> Self {
        Self {
            store,
            catalog,
            resources,
            observer,
        }
    }
}
