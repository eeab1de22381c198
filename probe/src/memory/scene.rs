//! In-memory entity graph
//!
//! Entities are stored in a flat table; the hierarchy is implied by parent links and sibling
//! order is table order. Enumeration is depth-first from the roots.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::constants::HIERARCHY_SEPARATOR;
use crate::host::{EntityStore, HostError};
use crate::model::{Capability, CapabilityId, Entity, EntityId, Object, TypeDescriptor};

const DEFAULT_TAG: &str = "Untagged";

const DEFAULT_LAYERS: &[(&str, u32)] = &[
    ("Default", 0),
    ("TransparentFX", 1),
    ("Ignore Raycast", 2),
    ("Water", 4),
    ("UI", 5),
];

/// A complete stand-alone graph
#[derive(Debug, Clone)]
pub struct MemoryScene {
    entities:        Vec<Entity>,
    layers:          Vec<(String, u32)>,
    transform:       Option<(TypeDescriptor, Object)>,
    next_entity:     i64,
    next_capability: i64,
}

impl Default for MemoryScene {
    fn default() -> Self { Self::new() }
}

impl MemoryScene {
    /// Empty scene with the default layer table
    pub fn new() -> Self {
        Self {
            entities:        Vec::new(),
            layers:          DEFAULT_LAYERS
                .iter()
                .map(|(name, index)| ((*name).to_string(), *index))
                .collect(),
            transform:       None,
            next_entity:     1,
            next_capability: 1,
        }
    }

    /// Builder: register a named layer
    #[must_use]
    pub fn with_layer(mut self, name: &str, index: u32) -> Self {
        self.layers.push((name.to_string(), index));
        self
    }

    /// Builder: attach a transform capability to every created entity; it cannot be removed
    #[must_use]
    pub fn with_transform(mut self, descriptor: TypeDescriptor, template: Object) -> Self {
        self.transform = Some((descriptor, template));
        self
    }

    /// Number of entities, inactive ones included
    pub fn len(&self) -> usize { self.entities.len() }

    /// True when the scene holds no entities
    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|entity| entity.id == id)
    }

    fn require(&self, id: EntityId) -> Result<usize, HostError> {
        self.position(id)
            .ok_or_else(|| HostError::new(format!("entity {id} does not exist")))
    }

    fn child_ids(&self, parent: Option<EntityId>) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(move |entity| entity.parent == parent)
            .map(|entity| entity.id)
    }

    fn walk(&self, id: EntityId, out: &mut Vec<EntityId>) {
        out.push(id);
        for child in self.child_ids(Some(id)) {
            self.walk(child, out);
        }
    }

    /// `id` followed by every descendant, depth-first
    fn subtree(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.walk(id, &mut out);
        out
    }

    fn is_within(&self, candidate: EntityId, ancestor: EntityId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent_of(id);
        }
        false
    }

    fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    fn allocate_capability(&mut self) -> CapabilityId {
        let id = CapabilityId(self.next_capability);
        self.next_capability += 1;
        id
    }

    fn is_transform(&self, descriptor: &TypeDescriptor) -> bool {
        self.transform
            .as_ref()
            .is_some_and(|(transform, _)| transform.full_name == descriptor.full_name)
    }
}

impl EntityStore for MemoryScene {
    fn all_entities(&self, include_inactive: bool) -> Vec<EntityId> {
        let mut out = Vec::with_capacity(self.entities.len());
        for root in self.child_ids(None) {
            self.walk(root, &mut out);
        }
        out.retain(|id| include_inactive || self.is_active_in_hierarchy(*id));
        out
    }

    fn children_of(&self, entity: EntityId, include_inactive: bool) -> Vec<EntityId> {
        self.child_ids(Some(entity))
            .filter(|id| include_inactive || self.is_active_in_hierarchy(*id))
            .collect()
    }

    fn find_by_hierarchy_path(&self, path: &str, scope_root: Option<EntityId>) -> Option<EntityId> {
        let mut current = scope_root;
        let mut matched = false;
        for name in path
            .split(HIERARCHY_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
        {
            let next = self.child_ids(current).find(|id| {
                self.entity(*id)
                    .is_some_and(|entity| entity.name == name)
            })?;
            current = Some(next);
            matched = true;
        }
        if matched { current } else { None }
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    fn is_active_in_hierarchy(&self, id: EntityId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(entity) = self.entity(current) else {
                return false;
            };
            if !entity.active_self {
                return false;
            }
            cursor = entity.parent;
        }
        true
    }

    fn layer_by_name(&self, name: &str) -> Option<u32> {
        self.layers
            .iter()
            .find(|(layer, _)| layer == name)
            .map(|(_, index)| *index)
    }

    fn create_entity(&mut self, name: &str, parent: Option<EntityId>) -> Result<EntityId, HostError> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }
        let id = self.allocate_entity();
        let mut capabilities = Vec::new();
        if let Some((descriptor, template)) = self.transform.clone() {
            capabilities.push(Capability {
                id:         self.allocate_capability(),
                descriptor,
                state:      template,
            });
        }
        self.entities.push(Entity {
            id,
            name: name.to_string(),
            tag: DEFAULT_TAG.to_string(),
            layer: 0,
            active_self: true,
            parent,
            capabilities,
        });
        debug!("created entity {id} '{name}'");
        Ok(id)
    }

    fn destroy_entity(&mut self, id: EntityId) -> Result<(), HostError> {
        self.require(id)?;
        let doomed: HashSet<EntityId> = self.subtree(id).into_iter().collect();
        self.entities.retain(|entity| !doomed.contains(&entity.id));
        debug!("destroyed entity {id} and {} descendant(s)", doomed.len() - 1);
        Ok(())
    }

    fn duplicate_entity(&mut self, id: EntityId, name: &str) -> Result<EntityId, HostError> {
        self.require(id)?;
        let originals = self.subtree(id);
        let mut remap: HashMap<EntityId, EntityId> = HashMap::with_capacity(originals.len());
        for original in &originals {
            let copy = self.allocate_entity();
            remap.insert(*original, copy);
        }

        let mut copies = Vec::with_capacity(originals.len());
        for original in &originals {
            let Some(source) = self.entity(*original).cloned() else {
                continue;
            };
            let mut copy = source;
            copy.id = remap[original];
            if *original == id {
                copy.name = name.to_string();
            } else {
                copy.parent = copy.parent.and_then(|parent| remap.get(&parent).copied());
            }
            for capability in &mut copy.capabilities {
                capability.id = self.allocate_capability();
            }
            copies.push(copy);
        }

        let root = remap[&id];
        self.entities.extend(copies);
        debug!("duplicated entity {id} as {root} '{name}'");
        Ok(root)
    }

    fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), HostError> {
        let position = self.require(id)?;
        if let Some(parent) = parent {
            self.require(parent)?;
            if self.is_within(parent, id) {
                return Err(HostError::new(format!(
                    "entity {parent} is {id} or one of its descendants"
                )));
            }
        }
        let mut entity = self.entities.remove(position);
        entity.parent = parent;
        self.entities.push(entity);
        Ok(())
    }

    fn add_capability(
        &mut self,
        id: EntityId,
        descriptor: TypeDescriptor,
        state: Object,
    ) -> Result<CapabilityId, HostError> {
        let position = self.require(id)?;
        if self.is_transform(&descriptor) {
            return Err(HostError::new(format!(
                "entity {id} already has a {}",
                descriptor.short_name()
            )));
        }
        let capability = self.allocate_capability();
        self.entities[position].capabilities.push(Capability {
            id: capability,
            descriptor,
            state,
        });
        Ok(capability)
    }

    fn remove_capability(&mut self, id: EntityId, capability: CapabilityId) -> Result<(), HostError> {
        let position = self.require(id)?;
        let capabilities = &self.entities[position].capabilities;
        let Some(index) = capabilities.iter().position(|c| c.id == capability) else {
            return Err(HostError::new(format!(
                "entity {id} has no capability {capability}"
            )));
        };
        if self.is_transform(&capabilities[index].descriptor) {
            return Err(HostError::new(format!(
                "the {} of entity {id} cannot be removed",
                capabilities[index].descriptor.short_name()
            )));
        }
        self.entities[position].capabilities.remove(index);
        Ok(())
    }
}
