//! Placement through the configured transform capability, and relative moves
//!
//! Rotations are Euler angles in degrees, applied z, then x, then y.

use error_stack::Report;
use serde_json::{Map, Value as Token, json};
use tracing::info;

use super::{
    EntityReport, FieldWrite, MoveRelativeParams, PlacementParams, Probe, apply_all_or_nothing,
    capability_id, capability_ids, path_mutator, summarize_all,
};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::host::{Host, MutationTarget};
use crate::model::{CapabilityId, EntityId, TypeDescriptor, Value, ValueType, VectorKind};
use crate::value_coercer::ValueCoercer;

type Vec3 = [f32; 3];

/// Placement values keyed by the configured member names
pub(super) fn placement_entries(
    config: &ProbeConfig,
    placement: &PlacementParams,
) -> Map<String, Token> {
    let binding = &config.transform;
    [
        (&binding.position, &placement.position),
        (&binding.rotation, &placement.rotation),
        (&binding.scale, &placement.scale),
    ]
    .into_iter()
    .filter_map(|(member, token)| token.as_ref().map(|token| (member.clone(), token.clone())))
    .collect()
}

/// Read a three-component member of the entity's transform
fn read_vec3(
    config: &ProbeConfig,
    host: &Host<'_>,
    entity: EntityId,
    transform: &TypeDescriptor,
    member: &str,
) -> Result<Vec3> {
    let capability = capability_id(&*host.store, entity, transform)?;
    let state = host
        .store
        .entity(entity)
        .and_then(|record| record.capabilities.iter().find(|c| c.id == capability))
        .map(|attached| &attached.state)
        .ok_or_else(|| Report::new(Error::not_found("capability", capability)))?;

    match path_mutator(config, host.catalog, host.resources).read_path(state, member)? {
        Value::Vec3(components) => Ok(components),
        other => Err(Report::new(Error::coercion(
            member,
            ValueType::Vector(VectorKind::Vec3),
            format!("{} holds a {}", transform.short_name(), other.shape()),
        ))),
    }
}

fn to_vec3(host: &Host<'_>, field: &str, token: &Token) -> Result<Vec3> {
    let target = ValueType::Vector(VectorKind::Vec3);
    match ValueCoercer::new(host.resources, host.catalog).coerce(field, token, &target, None)? {
        Value::Vec3(components) => Ok(components),
        other => Err(Report::new(Error::coercion(
            field,
            target,
            format!("expected 3 components, got {}", other.shape()),
        ))),
    }
}

/// Write a three-component member of the entity's transform; the caller notifies
pub(super) fn write_vec3(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    transform: &TypeDescriptor,
    member: &str,
    value: Vec3,
) -> Result<CapabilityId> {
    let capability = capability_id(&*host.store, entity, transform)?;
    let mut entries = Map::new();
    entries.insert(member.to_string(), json!(value));
    apply_all_or_nothing(config, host, entity, transform, capability, &entries)?;
    Ok(capability)
}

/// Move the entity's position by `delta`
pub(super) fn offset_position(
    config: &ProbeConfig,
    host: &mut Host<'_>,
    entity: EntityId,
    transform: &TypeDescriptor,
    delta: &Token,
) -> Result<CapabilityId> {
    let delta = to_vec3(host, "offset", delta)?;
    let position = read_vec3(config, host, entity, transform, &config.transform.position)?;
    write_vec3(
        config,
        host,
        entity,
        transform,
        &config.transform.position,
        add(position, delta),
    )
}

const fn add(a: Vec3, b: Vec3) -> Vec3 { [a[0] + b[0], a[1] + b[1], a[2] + b[2]] }

const fn scale(v: Vec3, factor: f32) -> Vec3 { [v[0] * factor, v[1] * factor, v[2] * factor] }

/// Rotate `v` by Euler angles in degrees (z, then x, then y)
fn rotate(euler: Vec3, v: Vec3) -> Vec3 {
    let [x, y, z] = euler.map(f32::to_radians);

    let (sin, cos) = z.sin_cos();
    let v = [v[0].mul_add(cos, -v[1] * sin), v[0].mul_add(sin, v[1] * cos), v[2]];

    let (sin, cos) = x.sin_cos();
    let v = [v[0], v[1].mul_add(cos, -v[2] * sin), v[1].mul_add(sin, v[2] * cos)];

    let (sin, cos) = y.sin_cos();
    [v[0].mul_add(cos, v[2] * sin), v[1], v[2].mul_add(cos, -v[0] * sin)]
}

impl Probe {
    /// Transform capability named by the configuration
    pub(super) fn transform_descriptor(&mut self, host: &Host<'_>) -> Result<TypeDescriptor> {
        let name = self.config.transform.capability.clone();
        self.resolve_capability_type(host, &name)
    }

    /// Place every matching entity relative to a reference entity
    ///
    /// The destination is the reference's position plus `direction * distance` plus `offset`.
    /// Unless `world_space` is set, the step is rotated into the reference's frame first.
    pub fn move_relative(
        &mut self,
        host: &mut Host<'_>,
        params: &MoveRelativeParams,
    ) -> Result<EntityReport> {
        if !params.distance.is_finite() {
            return Err(Report::new(Error::invalid(
                "distance",
                format!("{} is not a finite number", params.distance),
            )));
        }
        let targets = self.targets(host, &params.target)?;
        let reference = self.resolve_entity(host, &params.reference)?;
        if targets.contains(&reference) {
            return Err(Report::new(Error::invalid(
                "reference",
                "an entity cannot be moved relative to itself",
            )));
        }
        let transform = self.transform_descriptor(host)?;
        let binding = &self.config.transform;

        let origin = read_vec3(&self.config, host, reference, &transform, &binding.position)?;
        let offset = match &params.offset {
            Some(token) => to_vec3(host, "offset", token)?,
            None => [0.0; 3],
        };
        let mut step = add(scale(params.direction.axis(), params.distance), offset);
        if !params.world_space {
            let rotation = read_vec3(&self.config, host, reference, &transform, &binding.rotation)?;
            step = rotate(rotation, step);
        }
        let destination = add(origin, step);

        capability_ids(&*host.store, &targets, &transform)?;
        for entity in &targets {
            let capability =
                write_vec3(&self.config, host, *entity, &transform, &binding.position, destination)?;
            host.observer.notify_mutated(MutationTarget::Capability {
                entity: *entity,
                capability,
            });
            info!(
                "Moved entity {entity} {} of entity {reference} to {destination:?}",
                params.direction
            );
        }

        Ok(EntityReport {
            verb:     "Moved",
            entities: summarize_all(&*host.store, &targets)?,
            applied:  targets
                .iter()
                .map(|entity| FieldWrite::new(*entity, binding.position.as_str()))
                .collect(),
            failures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Vec3, expected: Vec3) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_rotation_order() {
        assert_close(rotate([0.0, 90.0, 0.0], [0.0, 0.0, 1.0]), [1.0, 0.0, 0.0]);
        assert_close(rotate([90.0, 0.0, 0.0], [0.0, 0.0, 1.0]), [0.0, -1.0, 0.0]);
        assert_close(rotate([0.0, 0.0, 90.0], [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
        // z first, then y: x axis -> y axis, unaffected by yaw
        assert_close(rotate([0.0, 90.0, 90.0], [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_vector_helpers() {
        assert_eq!(add([1.0, 2.0, 3.0], scale([1.0, 0.0, -1.0], 2.0)), [3.0, 2.0, 1.0]);
    }
}
