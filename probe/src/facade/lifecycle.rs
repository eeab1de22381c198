//! Creating, changing, destroying and copying entities

use error_stack::Report;
use itertools::Itertools;
use serde_json::{Map, Value as Token};
use tracing::{info, warn};

use super::capabilities::{attach, detach_all};
use super::placement::{offset_position, placement_entries};
use super::{
    BatchReport, CapabilitySpec, CreateParams, DeleteParams, DeleteResult, DuplicateParams,
    EntityReport, FieldWrite, ModifyParams, PlacementParams, Probe, apply_all_or_nothing,
    apply_batch, capability_id, capability_ids, is_within, resolve_layer, summarize,
    summarize_all,
};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::host::{EntityStore, Host, HostError, MutationTarget};
use crate::model::{CapabilityId, EntityId, TypeDescriptor};

/// Capability type plus the property entries to write on it
type CapabilityWrites = Vec<(TypeDescriptor, Map<String, Token>)>;

/// Everything a modify request resolves to before the first entity is touched
struct ModifyPlan<'p> {
    name:     Option<&'p str>,
    tag:      Option<&'p str>,
    layer:    Option<u32>,
    active:   Option<bool>,
    parent:   Option<Option<EntityId>>,
    removed:  Vec<TypeDescriptor>,
    added:    Vec<(TypeDescriptor, &'p Map<String, Token>)>,
    writes:   CapabilityWrites,
}

fn non_empty<'p>(what: &str, value: Option<&'p String>) -> Result<Option<&'p str>> {
    match value.map(|text| text.trim()) {
        Some("") => Err(Report::new(Error::missing(what))),
        other => Ok(other),
    }
}

fn host_failed(operation: &'static str) -> impl FnOnce(HostError) -> Report<Error> {
    move |e| Report::new(Error::host_failed(operation, e))
}

/// Destroy a half-built entity; failures are only logged
fn discard(host: &mut Host<'_>, entity: EntityId) {
    if let Err(e) = host.store.destroy_entity(entity) {
        warn!("Could not discard partially built entity {entity}: {e}");
    }
}

impl Probe {
    fn resolve_specs<'p>(
        &mut self,
        host: &Host<'_>,
        specs: &'p [CapabilitySpec],
    ) -> Result<Vec<(TypeDescriptor, &'p Map<String, Token>)>> {
        specs
            .iter()
            .map(|spec| {
                self.resolve_capability_type(host, &spec.type_name)
                    .map(|descriptor| (descriptor, &spec.properties))
            })
            .collect()
    }

    /// Transform descriptor when any placement value is present
    fn placement_transform(
        &mut self,
        host: &Host<'_>,
        placement: &PlacementParams,
    ) -> Result<Option<TypeDescriptor>> {
        if placement.is_empty() {
            Ok(None)
        } else {
            self.transform_descriptor(host).map(Some)
        }
    }

    fn resolve_parent_change(
        &mut self,
        host: &Host<'_>,
        parent: Option<&Option<String>>,
    ) -> Result<Option<Option<EntityId>>> {
        match parent {
            None => Ok(None),
            Some(None) => Ok(Some(None)),
            Some(Some(term)) => self.resolve_entity(host, term).map(|id| Some(Some(id))),
        }
    }

    /// Create an entity with optional parent, record fields, placement and capabilities
    ///
    /// All-or-nothing: if anything after the host created the entity fails, it is destroyed
    /// again and no creation is reported.
    pub fn create(&mut self, host: &mut Host<'_>, params: &CreateParams) -> Result<EntityReport> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(Report::new(Error::missing("name")));
        }
        let parent = params
            .parent
            .as_deref()
            .map(|term| self.resolve_entity(host, term))
            .transpose()?;
        let layer = params
            .layer
            .as_deref()
            .map(|layer| resolve_layer(&*host.store, layer))
            .transpose()?;
        let capabilities = self.resolve_specs(host, &params.capabilities)?;
        let transform = self.placement_transform(host, &params.placement)?;

        let entity = host
            .store
            .create_entity(name, parent)
            .map_err(host_failed("create entity"))?;

        let built = populate(
            &self.config,
            host,
            entity,
            params,
            layer,
            transform.as_ref(),
            &capabilities,
        );
        let applied = match built {
            Ok(applied) => applied,
            Err(report) => {
                discard(host, entity);
                return Err(report.attach(format!("Entity '{name}' was not created")));
            },
        };

        host.observer.notify_created(entity);
        info!("Created '{name}' (id {entity})");
        Ok(EntityReport {
            verb:     "Created",
            entities: vec![summarize(&*host.store, entity)?],
            applied:  applied
                .into_iter()
                .map(|field| FieldWrite::new(entity, field))
                .collect(),
            failures: Vec::new(),
        })
    }

    /// Change record fields, parent, capabilities and properties of every matching entity
    ///
    /// Everything named in the request is resolved before the first entity changes, including
    /// the capabilities to detach or write on each target. Host refusals are terminal; property
    /// writes are reported per entity and field.
    pub fn modify(&mut self, host: &mut Host<'_>, params: &ModifyParams) -> Result<EntityReport> {
        let targets = self.targets(host, &params.target)?;

        let layer = params
            .layer
            .as_deref()
            .map(|layer| resolve_layer(&*host.store, layer))
            .transpose()?;
        let parent = self.resolve_parent_change(host, params.parent.as_ref())?;
        let removed = params
            .remove_capabilities
            .iter()
            .map(|name| self.resolve_capability_type(host, name))
            .collect::<Result<Vec<_>>>()?;
        let added = self.resolve_specs(host, &params.add_capabilities)?;

        let mut writes = CapabilityWrites::new();
        if let Some(transform) = self.placement_transform(host, &params.placement)? {
            writes.push((transform, placement_entries(&self.config, &params.placement)));
        }
        for (name, entries) in &params.capability_properties {
            let Token::Object(entries) = entries else {
                return Err(Report::new(Error::invalid(
                    "capability_properties",
                    format!("'{name}' must map to an object of property paths"),
                )));
            };
            let descriptor = self.resolve_capability_type(host, name)?;
            match writes.iter_mut().find(|(known, _)| *known == descriptor) {
                Some((_, existing)) => existing.extend(entries.clone()),
                None => writes.push((descriptor, entries.clone())),
            }
        }

        if let Some(Some(new_parent)) = parent
            && let Some(entity) = targets
                .iter()
                .find(|entity| is_within(&*host.store, new_parent, **entity))
        {
            return Err(Report::new(Error::cannot(
                "re-parent",
                format!("entity {new_parent} is entity {entity} or one of its descendants"),
            )));
        }

        let plan = ModifyPlan {
            name: non_empty("name", params.name.as_ref())?,
            tag: params.tag.as_deref(),
            layer,
            active: params.active,
            parent,
            removed,
            added,
            writes,
        };

        let removals = plan
            .removed
            .iter()
            .map(|descriptor| capability_ids(&*host.store, &targets, descriptor))
            .collect::<Result<Vec<_>>>()?;
        check_writable(&*host.store, &targets, &plan)?;

        let mut report = BatchReport::default();
        for (index, entity) in targets.iter().enumerate() {
            let detach: Vec<CapabilityId> = removals.iter().map(|ids| ids[index].1).collect();
            match modify_one(&self.config, host, *entity, &plan, &detach) {
                Ok(written) => report.merge(written),
                Err(error) if index > 0 => {
                    return Err(error.attach(format!(
                        "Already modified: {}",
                        targets[..index].iter().join(", ")
                    )));
                },
                Err(error) => return Err(error),
            }
        }

        Ok(EntityReport {
            verb:     "Modified",
            entities: summarize_all(&*host.store, &targets)?,
            applied:  report.applied,
            failures: report.failures,
        })
    }

    /// Destroy every matching entity together with its subtree
    pub fn delete(&mut self, host: &mut Host<'_>, params: &DeleteParams) -> Result<DeleteResult> {
        let targets = self.targets(host, &params.target)?;

        let mut deleted = Vec::new();
        for entity in targets {
            // already gone with an ancestor matched earlier
            if host.store.entity(entity).is_none() {
                continue;
            }
            host.store
                .destroy_entity(entity)
                .map_err(host_failed("destroy entity"))?;
            host.observer.notify_destroyed(entity);
            info!("Destroyed entity {entity}");
            deleted.push(entity);
        }

        Ok(DeleteResult {
            count: deleted.len(),
            deleted,
        })
    }

    /// Copy the first matching entity and its subtree
    ///
    /// The copy is renamed, re-parented and placed as requested. If any of that fails the copy is
    /// destroyed again.
    pub fn duplicate(
        &mut self,
        host: &mut Host<'_>,
        params: &DuplicateParams,
    ) -> Result<EntityReport> {
        let source = self.first_target(host, &params.target)?;
        let parent = self.resolve_parent_change(host, params.parent.as_ref())?;
        let transform = if params.position.is_some() || params.offset.is_some() {
            Some(self.transform_descriptor(host)?)
        } else {
            None
        };
        let name = match non_empty("new_name", params.new_name.as_ref())? {
            Some(name) => name.to_string(),
            None => {
                let source_name = host
                    .store
                    .entity(source)
                    .map(|record| record.name.as_str())
                    .ok_or_else(|| Report::new(Error::not_found("entity", source)))?;
                format!("{source_name}{}", self.config.duplicate_suffix)
            },
        };

        let copy = host
            .store
            .duplicate_entity(source, &name)
            .map_err(host_failed("duplicate entity"))?;

        if let Err(report) =
            place_copy(&self.config, host, copy, parent, transform.as_ref(), params)
        {
            discard(host, copy);
            return Err(report.attach(format!("Copy '{name}' was discarded")));
        }

        host.observer.notify_created(copy);
        info!("Duplicated entity {source} as '{name}' (id {copy})");
        Ok(EntityReport {
            verb:     "Duplicated",
            entities: vec![summarize(&*host.store, copy)?],
            applied:  Vec::new(),
            failures: Vec::new(),
        })
    }
}

fn populate(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    params: &CreateParams,
    layer: Option<u32>,
    transform: Option<&TypeDescriptor>,
    capabilities: &[(TypeDescriptor, &Map<String, Token>)],
) -> Result<Vec<String>> {
    let record = host
        .store
        .entity_mut(entity)
        .ok_or_else(|| Report::new(Error::not_found("entity", entity)))?;
    if let Some(tag) = &params.tag {
        record.tag.clone_from(tag);
    }
    if let Some(layer) = layer {
        record.layer = layer;
    }
    if let Some(active) = params.active {
        record.active_self = active;
    }

    let mut applied = Vec::new();
    if let Some(transform) = transform {
        let capability = capability_id(&*host.store, entity, transform)?;
        let entries = placement_entries(config, &params.placement);
        applied.extend(apply_all_or_nothing(
            config,
            host,
            entity,
            transform,
            capability,
            &entries,
        )?);
    }

    for (descriptor, properties) in capabilities {
        // hosts may attach some capabilities on creation; write into those instead
        let existing = host
            .store
            .entity(entity)
            .and_then(|record| record.capability(descriptor.full_name.as_str()))
            .map(|attached| attached.id);
        match existing {
            Some(capability) => {
                apply_all_or_nothing(config, host, entity, descriptor, capability, properties)?;
            },
            None => {
                attach(config, host, entity, descriptor, properties)?;
            },
        }
        applied.extend(
            properties
                .keys()
                .map(|field| format!("{}.{field}", descriptor.short_name())),
        );
    }
    Ok(applied)
}

/// Every capability a property map names is either attached to each target or added by the
/// same request
fn check_writable(
    store: &dyn EntityStore,
    targets: &[EntityId],
    plan: &ModifyPlan<'_>,
) -> Result<()> {
    let pending = plan
        .writes
        .iter()
        .filter(|(descriptor, _)| !plan.added.iter().any(|(added, _)| added == descriptor))
        .map(|(descriptor, _)| descriptor);
    for descriptor in pending {
        capability_ids(store, targets, descriptor)?;
    }
    Ok(())
}

/// Record and capability changes for one entity, then its property writes
fn modify_one(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    plan: &ModifyPlan<'_>,
    detach: &[CapabilityId],
) -> Result<BatchReport> {
    let mut record_changed = false;
    let structural = modify_record(config, host, entity, plan, detach, &mut record_changed);
    if record_changed {
        host.observer.notify_mutated(MutationTarget::Entity(entity));
    }
    structural?;

    let mut report = BatchReport::default();
    for (descriptor, entries) in &plan.writes {
        let capability = capability_id(&*host.store, entity, descriptor)?;
        let written = apply_batch(config, host, entity, descriptor, capability, entries)?;
        if !written.applied.is_empty() {
            host.observer
                .notify_mutated(MutationTarget::Capability { entity, capability });
        }
        report.merge(written);
    }
    Ok(report)
}

/// Host-side changes first, so a refusal leaves the record untouched
///
/// Attachments are undone if the re-parent is refused. Detaching cannot be undone and runs
/// after both.
fn modify_record(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    plan: &ModifyPlan<'_>,
    detach: &[CapabilityId],
    changed: &mut bool,
) -> Result<()> {
    let mut attached = Vec::new();
    for (descriptor, properties) in &plan.added {
        match attach(config, host, entity, descriptor, properties) {
            Ok(capability) => attached.push((entity, capability)),
            Err(report) => {
                detach_all(host, &attached);
                return Err(report);
            },
        }
    }
    if let Some(parent) = plan.parent
        && let Err(e) = host.store.set_parent(entity, parent)
    {
        detach_all(host, &attached);
        return Err(host_failed("re-parent")(e));
    }
    *changed = !attached.is_empty() || plan.parent.is_some();

    for capability in detach {
        host.store
            .remove_capability(entity, *capability)
            .map_err(host_failed("remove capability"))?;
        *changed = true;
    }

    let record = host
        .store
        .entity_mut(entity)
        .ok_or_else(|| Report::new(Error::not_found("entity", entity)))?;
    if let Some(name) = plan.name {
        record.name = name.to_string();
        *changed = true;
    }
    if let Some(tag) = plan.tag {
        record.tag = tag.to_string();
        *changed = true;
    }
    if let Some(layer) = plan.layer {
        record.layer = layer;
        *changed = true;
    }
    if let Some(active) = plan.active {
        record.active_self = active;
        *changed = true;
    }
    Ok(())
}

fn place_copy(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    copy: EntityId,
    parent: Option<Option<EntityId>>,
    transform: Option<&TypeDescriptor>,
    params: &DuplicateParams,
) -> Result<()> {
    if let Some(parent) = parent {
        host.store
            .set_parent(copy, parent)
            .map_err(host_failed("re-parent"))?;
    }
    let Some(transform) = transform else {
        return Ok(());
    };
    if let Some(position) = &params.position {
        let mut entries = Map::new();
        entries.insert(config.transform.position.clone(), position.clone());
        let capability = capability_id(&*host.store, copy, transform)?;
        apply_all_or_nothing(config, host, copy, transform, capability, &entries)?;
    }
    if let Some(offset) = &params.offset {
        offset_position(config, host, copy, transform, offset)?;
    }
    Ok(())
}
