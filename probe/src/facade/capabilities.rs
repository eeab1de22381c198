//! Reading, attaching, detaching and writing capabilities

use error_stack::Report;
use itertools::Itertools;
use serde_json::{Map, Value as Token};
use tracing::{info, warn};

use super::{
    AddCapabilityParams, BatchReport, CapabilityPage, CapabilityRead, CapabilityView,
    EntityReport, FieldWrite, Probe, PropertySetResult, ReadCapabilitiesParams,
    ReadCapabilityParams, RemoveCapabilityParams, SetCapabilityPropertiesParams,
    apply_all_or_nothing, apply_batch, capability_id, capability_ids, path_mutator,
    summarize_all,
};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::host::{Host, MutationTarget};
use crate::model::{Capability, CapabilityId, EntityId, TypeDescriptor};

fn view(capability: &Capability, include_properties: bool, include_hidden: bool) -> CapabilityView {
    CapabilityView {
        id:         capability.id,
        type_name:  capability.descriptor.full_name.clone(),
        name:       capability.descriptor.short_name().to_string(),
        properties: include_properties.then(|| capability.state.to_json(include_hidden)),
    }
}

/// Attach a capability from the catalog's default state, then apply `properties`
///
/// If any property fails the capability is detached again and the first failure is returned.
/// Does not notify; the caller reports the entity change.
pub(super) fn attach(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    descriptor: &TypeDescriptor,
    properties: &Map<String, Token>,
) -> Result<CapabilityId> {
    let template = host.catalog.instantiate(&descriptor.full_name).ok_or_else(|| {
        Report::new(Error::NotFound(format!(
            "no default state for capability type '{}'",
            descriptor.full_name
        )))
    })?;
    let capability = host
        .store
        .add_capability(entity, descriptor.clone(), template)
        .map_err(|e| Report::new(Error::host_failed("add capability", e)))?;

    if properties.is_empty() {
        return Ok(capability);
    }
    match apply_all_or_nothing(config, host, entity, descriptor, capability, properties) {
        Ok(_) => Ok(capability),
        Err(report) => {
            detach_all(host, &[(entity, capability)]);
            Err(report.attach(format!(
                "{} was not added to entity {entity}",
                descriptor.short_name()
            )))
        },
    }
}

/// Undo attachments made earlier in the same request; failures are only logged
pub(super) fn detach_all(host: &mut Host<'_>, attached: &[(EntityId, CapabilityId)]) {
    for (entity, capability) in attached {
        if let Err(e) = host.store.remove_capability(*entity, *capability) {
            warn!("Rollback of capability {capability} on entity {entity} failed: {e}");
        }
    }
}

impl Probe {
    /// List the capabilities of the first matching entity, one page at a time
    pub fn read_capabilities(
        &mut self,
        host: &Host<'_>,
        params: &ReadCapabilitiesParams,
    ) -> Result<CapabilityPage> {
        let page_size = match params.page_size {
            None => self.config.default_page_size,
            Some(0) => {
                return Err(Report::new(Error::invalid(
                    "page_size",
                    "must be at least 1",
                )));
            },
            Some(requested) => requested.min(self.config.max_page_size),
        };
        let include_hidden = params
            .include_hidden
            .unwrap_or(self.config.include_hidden_by_default);
        let include_properties = params.include_properties.unwrap_or(true);

        let entity = self.first_target(host, &params.target)?;
        let record = host
            .store
            .entity(entity)
            .ok_or_else(|| Report::new(Error::not_found("entity", entity)))?;

        let total = record.capabilities.len();
        if params.cursor > total {
            return Err(Report::new(Error::invalid(
                "cursor",
                format!("{} is past the last capability ({total})", params.cursor),
            )));
        }
        let capabilities: Vec<CapabilityView> = record
            .capabilities
            .iter()
            .skip(params.cursor)
            .take(page_size)
            .map(|capability| view(capability, include_properties, include_hidden))
            .collect();
        let end = params.cursor + capabilities.len();

        Ok(CapabilityPage {
            entity,
            capabilities,
            total,
            cursor: params.cursor,
            next_cursor: (end < total).then_some(end),
        })
    }

    /// Read one capability, or one property path inside it
    pub fn read_capability(
        &mut self,
        host: &Host<'_>,
        params: &ReadCapabilityParams,
    ) -> Result<CapabilityRead> {
        let entity = self.first_target(host, &params.target)?;
        let descriptor = self.resolve_capability_type(host, &params.capability)?;
        let include_hidden = params
            .include_hidden
            .unwrap_or(self.config.include_hidden_by_default);

        let id = capability_id(&*host.store, entity, &descriptor)?;
        let capability = host
            .store
            .entity(entity)
            .and_then(|record| record.capabilities.iter().find(|c| c.id == id))
            .ok_or_else(|| Report::new(Error::not_found("capability", id)))?;

        let value = match &params.property {
            Some(path) => Some(
                path_mutator(&self.config, host.catalog, host.resources)
                    .read_path(&capability.state, path)?
                    .to_json(include_hidden),
            ),
            None => None,
        };
        Ok(CapabilityRead {
            entity,
            capability: view(capability, value.is_none(), include_hidden),
            path: params.property.clone(),
            value,
        })
    }

    /// Attach a capability to every matching entity
    ///
    /// All-or-nothing across targets: if any attachment fails, the ones already made in this
    /// request are detached again and nothing is reported.
    pub fn add_capability(
        &mut self,
        host: &mut Host<'_>,
        params: &AddCapabilityParams,
    ) -> Result<EntityReport> {
        let targets = self.targets(host, &params.target)?;
        let descriptor = self.resolve_capability_type(host, &params.capability)?;

        let mut attached: Vec<(EntityId, CapabilityId)> = Vec::new();
        for entity in &targets {
            match attach(&self.config, host, *entity, &descriptor, &params.properties) {
                Ok(capability) => attached.push((*entity, capability)),
                Err(report) => {
                    detach_all(host, &attached);
                    return Err(report);
                },
            }
        }

        for (entity, _) in &attached {
            host.observer.notify_mutated(MutationTarget::Entity(*entity));
            info!("Added {} to entity {entity}", descriptor.short_name());
        }

        Ok(EntityReport {
            verb:     "Added capability to",
            entities: summarize_all(&*host.store, &targets)?,
            applied:  targets
                .iter()
                .flat_map(|entity| {
                    params
                        .properties
                        .keys()
                        .map(|field| FieldWrite::new(*entity, field.as_str()))
                })
                .collect(),
            failures: Vec::new(),
        })
    }

    /// Detach a capability from every matching entity
    ///
    /// Every target must carry the capability; otherwise nothing is detached.
    pub fn remove_capability(
        &mut self,
        host: &mut Host<'_>,
        params: &RemoveCapabilityParams,
    ) -> Result<EntityReport> {
        let targets = self.targets(host, &params.target)?;
        let descriptor = self.resolve_capability_type(host, &params.capability)?;

        let attached = capability_ids(&*host.store, &targets, &descriptor)?;

        let mut removed = Vec::new();
        for (entity, capability) in attached {
            if let Err(e) = host.store.remove_capability(entity, capability) {
                let mut report = Report::new(Error::host_failed("remove capability", e))
                    .attach(format!("Entity: {entity}"));
                if !removed.is_empty() {
                    report = report.attach(format!(
                        "Already removed from: {}",
                        removed.iter().join(", ")
                    ));
                }
                return Err(report);
            }
            host.observer.notify_mutated(MutationTarget::Entity(entity));
            info!("Removed {} from entity {entity}", descriptor.short_name());
            removed.push(entity);
        }

        Ok(EntityReport {
            verb:     "Removed capability from",
            entities: summarize_all(&*host.store, &targets)?,
            applied:  Vec::new(),
            failures: Vec::new(),
        })
    }

    /// Write property paths on a capability of every matching entity
    ///
    /// Every target must carry the capability before anything is written. Each entry then applies
    /// independently; failures are reported per entity and field while the rest still apply.
    pub fn set_capability_properties(
        &mut self,
        host: &mut Host<'_>,
        params: &SetCapabilityPropertiesParams,
    ) -> Result<PropertySetResult> {
        let entries = params.entries();
        if entries.is_empty() {
            return Err(Report::new(Error::missing("properties")));
        }
        let targets = self.targets(host, &params.target)?;
        let descriptor = self.resolve_capability_type(host, &params.capability)?;

        let attached = capability_ids(&*host.store, &targets, &descriptor)?;

        let mut report = BatchReport::default();
        for (entity, capability) in attached {
            let written =
                apply_batch(&self.config, host, entity, &descriptor, capability, &entries)?;
            if !written.applied.is_empty() {
                host.observer
                    .notify_mutated(MutationTarget::Capability { entity, capability });
            }
            report.merge(written);
        }

        Ok(PropertySetResult {
            entities: targets,
            capability: descriptor.full_name,
            report,
        })
    }
}
