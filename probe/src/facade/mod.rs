//! Mutation façade: the operations exposed to callers
//!
//! A [`Probe`] is one host session. It owns the [`TypeCache`] and the configuration, and borrows
//! the host collaborators per call through [`Host`]. Operations are available as typed methods
//! and through [`Probe::execute`], which takes an action name and a JSON parameter bag.
//!
//! ## Failure policy
//!
//! - resolving the target entity or a named type is terminal
//! - batch property sets apply every entry independently and report failures by field
//! - create, duplicate and capability attachment are all-or-nothing: a failure removes what was
//!   built
//!
//! Every logically distinct change notifies the host's [`crate::host::MutationObserver`] once.

mod capabilities;
mod find;
mod lifecycle;
mod params;
mod placement;
mod response;
#[cfg(test)]
mod tests;

use error_stack::Report;
use itertools::Itertools;
pub use params::{
    AddCapabilityParams, CapabilitySpec, CreateParams, DeleteParams, Direction, DuplicateParams,
    FindParams, ModifyParams, MoveRelativeParams, PlacementParams, ReadCapabilitiesParams,
    ReadCapabilityParams, RemoveCapabilityParams, SetCapabilityPropertiesParams, TargetParams,
};
pub use response::{
    BatchReport, CapabilityPage, CapabilityRead, CapabilityView, CommandResponse, DeleteResult,
    EntityReport, EntitySummary, ErrorPayload, FieldFailure, FieldWrite, FindResult,
    PropertySetResult, Reply,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Token};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::constants::HIERARCHY_SEPARATOR;
use crate::entity_resolver::{EntityQuery, EntityResolver};
use crate::error::{Error, Result};
use crate::host::{EntityStore, Host, ResourceLookup, TypeCatalog};
use crate::model::{CapabilityId, EntityId, Object, TypeCategory, TypeDescriptor};
use crate::path_mutator::PathMutator;
use crate::type_resolver::{TypeCache, TypeResolver};
use crate::value_coercer::ValueCoercer;

/// Operation names accepted by [`Probe::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Action {
    /// [`Probe::find`]
    Find,
    /// [`Probe::read_capabilities`]
    #[strum(to_string = "read_capabilities", serialize = "get_components")]
    ReadCapabilities,
    /// [`Probe::read_capability`]
    #[strum(to_string = "read_capability", serialize = "get_component")]
    ReadCapability,
    /// [`Probe::create`]
    Create,
    /// [`Probe::modify`]
    Modify,
    /// [`Probe::delete`]
    Delete,
    /// [`Probe::duplicate`]
    Duplicate,
    /// [`Probe::add_capability`]
    #[strum(to_string = "add_capability", serialize = "add_component")]
    AddCapability,
    /// [`Probe::remove_capability`]
    #[strum(to_string = "remove_capability", serialize = "remove_component")]
    RemoveCapability,
    /// [`Probe::set_capability_properties`]
    #[strum(to_string = "set_capability_properties", serialize = "set_component_property")]
    SetCapabilityProperties,
    /// [`Probe::move_relative`]
    MoveRelative,
}

/// One host session
#[derive(Debug, Clone, Default)]
pub struct Probe {
    config: ProbeConfig,
    types:  TypeCache,
}

impl Probe {
    /// Start a session with an empty type cache
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            types: TypeCache::new(),
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &ProbeConfig { &self.config }

    /// Types resolved so far in this session
    pub const fn type_cache(&self) -> &TypeCache { &self.types }

    /// Run an operation by name
    ///
    /// `params` is the operation's parameter struct in JSON form; `null` counts as `{}`. Never
    /// fails: errors are reported inside the [`CommandResponse`].
    pub fn execute(&mut self, host: &mut Host<'_>, action: &str, params: Token) -> CommandResponse {
        let Ok(action) = action.trim().parse::<Action>() else {
            return CommandResponse::failure(&Report::new(Error::invalid(
                "action",
                format!("'{action}'. Valid actions: {}", Action::iter().join(", ")),
            )));
        };
        debug!("Executing {action}");

        match action {
            Action::Find => dispatch(action, params, |p: FindParams| self.find(host, &p)),
            Action::ReadCapabilities => dispatch(action, params, |p: ReadCapabilitiesParams| {
                self.read_capabilities(host, &p)
            }),
            Action::ReadCapability => dispatch(action, params, |p: ReadCapabilityParams| {
                self.read_capability(host, &p)
            }),
            Action::Create => dispatch(action, params, |p: CreateParams| self.create(host, &p)),
            Action::Modify => dispatch(action, params, |p: ModifyParams| self.modify(host, &p)),
            Action::Delete => dispatch(action, params, |p: DeleteParams| self.delete(host, &p)),
            Action::Duplicate => {
                dispatch(action, params, |p: DuplicateParams| self.duplicate(host, &p))
            },
            Action::AddCapability => dispatch(action, params, |p: AddCapabilityParams| {
                self.add_capability(host, &p)
            }),
            Action::RemoveCapability => dispatch(action, params, |p: RemoveCapabilityParams| {
                self.remove_capability(host, &p)
            }),
            Action::SetCapabilityProperties => {
                dispatch(action, params, |p: SetCapabilityPropertiesParams| {
                    self.set_capability_properties(host, &p)
                })
            },
            Action::MoveRelative => dispatch(action, params, |p: MoveRelativeParams| {
                self.move_relative(host, &p)
            }),
        }
    }

    /// Every entity the target parameters match; none is an error
    fn targets(&mut self, host: &Host<'_>, target: &TargetParams) -> Result<Vec<EntityId>> {
        EntityResolver::new(&*host.store, host.catalog, &mut self.types)
            .find_required(&EntityQuery::from(target))
    }

    /// First entity the target parameters match
    fn first_target(&mut self, host: &Host<'_>, target: &TargetParams) -> Result<EntityId> {
        self.targets(host, target)?
            .into_iter()
            .next()
            .ok_or_else(|| Report::new(Error::not_found("entity", &target.target)))
    }

    /// A parent or reference entity; must match exactly one entity, inactive ones included
    fn resolve_entity(&mut self, host: &Host<'_>, term: &str) -> Result<EntityId> {
        EntityResolver::new(&*host.store, host.catalog, &mut self.types).resolve_unique(term, true)
    }

    fn resolve_capability_type(&mut self, host: &Host<'_>, name: &str) -> Result<TypeDescriptor> {
        TypeResolver::new(host.catalog, &mut self.types).resolve(name, TypeCategory::Capability)
    }
}

fn dispatch<P, R>(
    action: Action,
    params: Token,
    run: impl FnOnce(P) -> Result<R>,
) -> CommandResponse
where
    P: DeserializeOwned,
    R: Reply,
{
    let params = if params.is_null() {
        Token::Object(Map::new())
    } else {
        params
    };
    let result = serde_json::from_value::<P>(params)
        .map_err(|e| Report::new(Error::invalid(&format!("{action} parameters"), e)))
        .and_then(run);

    match result {
        Ok(reply) => {
            let failures = reply.failures();
            let error = failures.first().map(|first| ErrorPayload {
                kind:    first.kind,
                message: first.message.clone(),
                details: failures
                    .iter()
                    .map(|failure| {
                        format!(
                            "entity {} {}: {}",
                            failure.entity, failure.field, failure.message
                        )
                    })
                    .collect(),
            });
            CommandResponse {
                success: error.is_none(),
                message: reply.message(),
                data: serde_json::to_value(&reply).ok(),
                error,
            }
        },
        Err(report) => {
            debug!("{action} failed: {report:?}");
            CommandResponse::failure(&report)
        },
    }
}

/// Path mutator bound to the session's shader sigil and the host's catalog and assets
fn path_mutator<'a>(
    config: &'a ProbeConfig,
    catalog: &'a dyn TypeCatalog,
    resources: &'a dyn ResourceLookup,
) -> PathMutator<'a> {
    PathMutator::new(ValueCoercer::new(resources, catalog), &config.shader_sigil)
}

/// Run `write` against the state of one attached capability
fn with_capability_state<R>(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    capability: CapabilityId,
    write: impl FnOnce(&PathMutator<'_>, &mut Object) -> R,
) -> Result<R> {
    let mutator = path_mutator(config, host.catalog, host.resources);
    let state = host
        .store
        .entity_mut(entity)
        .and_then(|record| record.capability_by_id_mut(capability))
        .map(|attached| &mut attached.state)
        .ok_or_else(|| {
            Report::new(Error::NotFound(format!(
                "entity {entity} has no capability {capability}"
            )))
        })?;
    Ok(write(&mutator, state))
}

/// Apply every entry independently; failures are collected, not returned
fn apply_batch(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    capability: &TypeDescriptor,
    capability_id: CapabilityId,
    entries: &Map<String, Token>,
) -> Result<BatchReport> {
    with_capability_state(config, host, entity, capability_id, |mutator, state| {
        let mut report = BatchReport::default();
        for (field, token) in entries {
            match mutator.apply_path(state, field, token) {
                Ok(()) => report.applied.push(FieldWrite::new(entity, field.as_str())),
                Err(error) => {
                    warn!(
                        "Could not set {}.{field} on entity {entity}: {}",
                        capability.short_name(),
                        error.current_context()
                    );
                    report
                        .failures
                        .push(FieldFailure::new(entity, field, &capability.full_name, &error));
                },
            }
        }
        report
    })
}

/// Apply entries in order, stopping at the first failure
fn apply_all_or_nothing(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    capability: &TypeDescriptor,
    capability_id: CapabilityId,
    entries: &Map<String, Token>,
) -> Result<Vec<String>> {
    with_capability_state(config, host, entity, capability_id, |mutator, state| {
        entries
            .iter()
            .map(|(field, token)| {
                mutator
                    .apply_path(state, field, token)
                    .map(|()| field.clone())
                    .map_err(|error| {
                        error.attach(format!(
                            "Capability: {}",
                            capability.full_name
                        ))
                    })
            })
            .collect::<Result<Vec<String>>>()
    })?
}

/// Attachment id of the first capability of the given type
fn capability_id(
    store: &dyn EntityStore,
    entity: EntityId,
    descriptor: &TypeDescriptor,
) -> Result<CapabilityId> {
    let record = store
        .entity(entity)
        .ok_or_else(|| Report::new(Error::not_found("entity", entity)))?;
    record
        .capability(descriptor.full_name.as_str())
        .map(|attached| attached.id)
        .ok_or_else(|| {
            Report::new(Error::NotFound(format!(
                "'{}' (id {entity}) has no {} capability",
                record.name,
                descriptor.short_name()
            )))
        })
}

/// Attachment ids of a capability type on every target; fails before anything changes
fn capability_ids(
    store: &dyn EntityStore,
    targets: &[EntityId],
    descriptor: &TypeDescriptor,
) -> Result<Vec<(EntityId, CapabilityId)>> {
    targets
        .iter()
        .map(|entity| capability_id(store, *entity, descriptor).map(|id| (*entity, id)))
        .collect()
}

/// Layer index for a layer name or numeric index
fn resolve_layer(store: &dyn EntityStore, layer: &str) -> Result<u32> {
    let layer = layer.trim();
    layer
        .parse::<u32>()
        .ok()
        .or_else(|| store.layer_by_name(layer))
        .ok_or_else(|| Report::new(Error::not_found("layer", layer)))
}

/// Whether `candidate` is `ancestor` or one of its descendants
fn is_within(store: &dyn EntityStore, candidate: EntityId, ancestor: EntityId) -> bool {
    let mut cursor = Some(candidate);
    while let Some(id) = cursor {
        if id == ancestor {
            return true;
        }
        cursor = store.parent_of(id);
    }
    false
}

fn hierarchy_path(store: &dyn EntityStore, entity: EntityId) -> String {
    let mut names = Vec::new();
    let mut cursor = Some(entity);
    while let Some(id) = cursor {
        let Some(record) = store.entity(id) else {
            break;
        };
        names.push(record.name.as_str());
        cursor = record.parent;
    }
    names.iter().rev().join(&HIERARCHY_SEPARATOR.to_string())
}

fn summarize(store: &dyn EntityStore, entity: EntityId) -> Result<EntitySummary> {
    let record = store
        .entity(entity)
        .ok_or_else(|| Report::new(Error::not_found("entity", entity)))?;
    Ok(EntitySummary {
        id:           record.id,
        name:         record.name.clone(),
        path:         hierarchy_path(store, entity),
        tag:          record.tag.clone(),
        layer:        record.layer,
        active:       record.active_self,
        parent:       record.parent,
        capabilities: record
            .capabilities
            .iter()
            .map(|attached| attached.descriptor.short_name().to_string())
            .collect(),
    })
}

fn summarize_all(store: &dyn EntityStore, entities: &[EntityId]) -> Result<Vec<EntitySummary>> {
    entities.iter().map(|id| summarize(store, *id)).collect()
}
