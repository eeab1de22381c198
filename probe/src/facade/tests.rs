#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::result::Result;

use serde_json::{Value as Token, json};

use super::*;
use crate::error::ErrorKind;
use crate::host::{EntityStore, HostError, MutationTarget};
use crate::memory::{MemoryCatalog, MemoryResources, MemoryScene, Notification, RecordingObserver};
use crate::model::{
    CapabilityId, Entity, Member, ModuleOrigin, Object, TypeCategory, TypeDescriptor, Value, ValueType,
    VectorKind,
};

const TRANSFORM: &str = "Engine.Transform";
const RIGIDBODY: &str = "Engine.Physics.Rigidbody";
const HEALTH: &str = "Game.Health";
const INVENTORY: &str = "Game.Inventory";

fn vec3() -> ValueType { ValueType::Vector(VectorKind::Vec3) }

fn transform() -> Object {
    Object::new(TRANSFORM)
        .with(Member::property("localPosition", vec3(), Value::Vec3([0.0; 3])))
        .with(Member::property("localEulerAngles", vec3(), Value::Vec3([0.0; 3])))
        .with(Member::property("localScale", vec3(), Value::Vec3([1.0; 3])))
}

fn rigidbody() -> Object {
    Object::new(RIGIDBODY)
        .with(Member::property("mass", ValueType::Float, Value::Float(1.0)))
        .with(Member::property("useGravity", ValueType::Bool, Value::Bool(true)))
        .with(Member::field("drag", ValueType::Float, Value::Float(0.0)))
}

fn health() -> Object {
    Object::new(HEALTH)
        .with(Member::field("current", ValueType::Int, Value::Int(100)))
        .with(Member::property("isDead", ValueType::Bool, Value::Bool(false)).read_only())
}

fn inventory(slots: &[i64]) -> Object {
    Object::new(INVENTORY).with(Member::field(
        "slots",
        ValueType::List(Box::new(ValueType::Int)),
        Value::List(slots.iter().copied().map(Value::Int).collect()),
    ))
}

/// Delegates to a [`MemoryScene`] but refuses attaching one capability type to one entity
struct Refusing<'s> {
    scene:  &'s mut MemoryScene,
    entity: EntityId,
    refuse: &'static str,
}

impl EntityStore for Refusing<'_> {
    fn all_entities(&self, include_inactive: bool) -> Vec<EntityId> {
        self.scene.all_entities(include_inactive)
    }

    fn children_of(&self, entity: EntityId, include_inactive: bool) -> Vec<EntityId> {
        self.scene.children_of(entity, include_inactive)
    }

    fn find_by_hierarchy_path(&self, path: &str, scope_root: Option<EntityId>) -> Option<EntityId> {
        self.scene.find_by_hierarchy_path(path, scope_root)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> { self.scene.entity(id) }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> { self.scene.entity_mut(id) }

    fn is_active_in_hierarchy(&self, id: EntityId) -> bool { self.scene.is_active_in_hierarchy(id) }

    fn layer_by_name(&self, name: &str) -> Option<u32> { self.scene.layer_by_name(name) }

    fn create_entity(&mut self, name: &str, parent: Option<EntityId>) -> Result<EntityId, HostError> {
        self.scene.create_entity(name, parent)
    }

    fn destroy_entity(&mut self, id: EntityId) -> Result<(), HostError> {
        self.scene.destroy_entity(id)
    }

    fn duplicate_entity(&mut self, id: EntityId, name: &str) -> Result<EntityId, HostError> {
        self.scene.duplicate_entity(id, name)
    }

    fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), HostError> {
        self.scene.set_parent(id, parent)
    }

    fn add_capability(
        &mut self,
        id: EntityId,
        descriptor: TypeDescriptor,
        state: Object,
    ) -> Result<CapabilityId, HostError> {
        if id == self.entity && descriptor.full_name.as_str() == self.refuse {
            return Err(HostError::new(format!("entity {id} refuses {}", self.refuse)));
        }
        self.scene.add_capability(id, descriptor, state)
    }

    fn remove_capability(&mut self, id: EntityId, capability: CapabilityId) -> Result<(), HostError> {
        self.scene.remove_capability(id, capability)
    }
}

struct Fixture {
    scene:     MemoryScene,
    catalog:   MemoryCatalog,
    resources: MemoryResources,
    observer:  RecordingObserver,
    probe:     Probe,
    level:     EntityId,
    foo_child: EntityId,
    foo_root:  EntityId,
    player:    EntityId,
}

impl Fixture {
    fn new() -> Self {
        let catalog = MemoryCatalog::new()
            .with_module("Engine", ModuleOrigin::Preferred)
            .with_module("Game", ModuleOrigin::Preferred)
            .with_capability(TRANSFORM, "Engine", transform())
            .with_capability(RIGIDBODY, "Engine", rigidbody())
            .with_capability(HEALTH, "Game", health())
            .with_capability(INVENTORY, "Game", inventory(&[]));
        let mut scene = MemoryScene::new().with_transform(
            TypeDescriptor::new(TRANSFORM, "Engine", TypeCategory::Capability),
            transform(),
        );

        let level = scene.create_entity("Level", None).unwrap();
        let foo_child = scene.create_entity("Foo", Some(level)).unwrap();
        let foo_root = scene.create_entity("Foo", None).unwrap();
        let player = scene.create_entity("Player", None).unwrap();
        for (full_name, module, state) in [(RIGIDBODY, "Engine", rigidbody()), (HEALTH, "Game", health())] {
            scene
                .add_capability(
                    player,
                    TypeDescriptor::new(full_name, module, TypeCategory::Capability),
                    state,
                )
                .unwrap();
        }

        Self {
            scene,
            catalog,
            resources: MemoryResources::new(),
            observer: RecordingObserver::new(),
            probe: Probe::new(ProbeConfig::default()),
            level,
            foo_child,
            foo_root,
            player,
        }
    }

    fn run(&mut self, action: &str, params: Token) -> CommandResponse {
        let mut host = Host::new(
            &mut self.scene,
            &self.catalog,
            &self.resources,
            &mut self.observer,
        );
        self.probe.execute(&mut host, action, params)
    }

    fn run_refusing(
        &mut self,
        (entity, refuse): (EntityId, &'static str),
        action: &str,
        params: Token,
    ) -> CommandResponse {
        let mut store = Refusing {
            scene: &mut self.scene,
            entity,
            refuse,
        };
        let mut host = Host::new(&mut store, &self.catalog, &self.resources, &mut self.observer);
        self.probe.execute(&mut host, action, params)
    }

    fn attach(&mut self, entity: EntityId, full_name: &str, module: &str, state: Object) {
        self.scene
            .add_capability(
                entity,
                TypeDescriptor::new(full_name, module, TypeCategory::Capability),
                state,
            )
            .unwrap();
    }

    fn record(&self, id: EntityId) -> &Entity { self.scene.entity(id).unwrap() }

    fn value(&self, id: EntityId, capability: &str, member: &str) -> Value {
        self.record(id)
            .capability(capability)
            .unwrap_or_else(|| panic!("entity {id} has no {capability}"))
            .state
            .get(member)
            .unwrap()
            .clone()
    }

    fn position(&self, id: EntityId) -> [f32; 3] {
        match self.value(id, TRANSFORM, "localPosition") {
            Value::Vec3(position) => position,
            other => panic!("unexpected position {other:?}"),
        }
    }

    fn named(&self, name: &str) -> Vec<EntityId> {
        self.scene
            .all_entities(true)
            .into_iter()
            .filter(|id| self.record(*id).name == name)
            .collect()
    }
}

fn error_kind(response: &CommandResponse) -> ErrorKind {
    assert!(!response.success, "expected failure: {response:?}");
    response.error.as_ref().unwrap().kind
}

fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
    }
}

#[test]
fn test_find_by_name_returns_first_unless_find_all() {
    let mut fixture = Fixture::new();

    let first = fixture.run("find", json!({ "search_term": "Foo", "search_method": "by_name" }));
    assert!(first.success);
    let data = first.data.unwrap();
    assert_eq!(data["count"], 1);
    assert_eq!(data["entities"][0]["id"], json!(fixture.foo_child.0));
    assert_eq!(data["entities"][0]["path"], "Level/Foo");

    let all = fixture.run(
        "find",
        json!({ "search_term": "Foo", "search_method": "by_name", "find_all": true }),
    );
    let data = all.data.unwrap();
    assert_eq!(data["count"], 2);
    assert_eq!(data["entities"][1]["id"], json!(fixture.foo_root.0));
}

#[test]
fn test_find_without_match_is_an_empty_success() {
    let mut fixture = Fixture::new();
    let response = fixture.run("find", json!({ "search_term": "Nobody" }));
    assert!(response.success);
    assert_eq!(response.data.unwrap()["count"], 0);
}

#[test]
fn test_unknown_action_and_bad_parameters() {
    let mut fixture = Fixture::new();

    let response = fixture.run("explode", json!({}));
    assert_eq!(error_kind(&response), ErrorKind::InvalidArgument);
    assert!(response.message.contains("move_relative"));

    let response = fixture.run("find", json!({ "search_method": "by_name" }));
    assert_eq!(error_kind(&response), ErrorKind::InvalidArgument);

    let response = fixture.run("get_components", Token::Null);
    assert_eq!(error_kind(&response), ErrorKind::InvalidArgument);
}

#[test]
fn test_batch_set_reports_failed_fields_and_applies_the_rest() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "set_component_property",
        json!({
            "target": "Player",
            "capability": "Transform",
            "properties": { "position": [1, 2, 3], "localScale": [2, 2, 2] }
        }),
    );

    assert_eq!(error_kind(&response), ErrorKind::PathError);
    let data = response.data.unwrap();
    assert_eq!(
        data["applied"],
        json!([{ "entity": fixture.player.0, "field": "localScale" }])
    );
    assert_eq!(data["failures"][0]["entity"], json!(fixture.player.0));
    assert_eq!(data["failures"][0]["field"], "position");
    assert_eq!(data["failures"][0]["kind"], "PathError");
    assert!(
        data["failures"][0]["message"]
            .as_str()
            .unwrap()
            .contains("localPosition")
    );

    assert_eq!(fixture.value(fixture.player, TRANSFORM, "localScale"), Value::Vec3([2.0; 3]));
    assert_eq!(fixture.position(fixture.player), [0.0; 3]);

    let transform_id = fixture.record(fixture.player).capability(TRANSFORM).unwrap().id;
    assert_eq!(
        fixture.observer.notifications(),
        &[Notification::Mutated(MutationTarget::Capability {
            entity:     fixture.player,
            capability: transform_id,
        })]
    );
}

#[test]
fn test_batch_set_with_no_applied_field_does_not_notify() {
    let mut fixture = Fixture::new();
    let response = fixture.run(
        "set_capability_properties",
        json!({ "target": "Player", "capability": "Health", "property": "isDead", "value": true }),
    );
    assert_eq!(error_kind(&response), ErrorKind::PathError);
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_unresolvable_target_is_terminal() {
    let mut fixture = Fixture::new();
    let response = fixture.run(
        "set_capability_properties",
        json!({ "target": "Ghost", "capability": "Rigidbody", "properties": { "mass": 2 } }),
    );
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert!(response.data.is_none());
}

#[test]
fn test_add_capability_with_failing_property_leaves_nothing_attached() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "add_component",
        json!({
            "target": "Level",
            "capability": "Rigidbody",
            "properties": { "mass": 4, "useGravity": "sideways" }
        }),
    );

    assert_eq!(error_kind(&response), ErrorKind::CoercionError);
    let error = response.error.unwrap();
    assert!(error.details.iter().any(|detail| detail.contains("Rigidbody")));
    assert!(!fixture.record(fixture.level).has_capability(RIGIDBODY));
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_add_and_remove_capability() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "add_capability",
        json!({ "target": "Level", "capability": "Rigidbody", "properties": { "mass": 4 } }),
    );
    assert!(response.success, "{response:?}");
    assert_eq!(fixture.value(fixture.level, RIGIDBODY, "mass"), Value::Float(4.0));

    let response = fixture.run(
        "remove_component",
        json!({ "target": fixture.level.0, "capability": RIGIDBODY }),
    );
    assert!(response.success, "{response:?}");
    assert!(!fixture.record(fixture.level).has_capability(RIGIDBODY));
    assert_eq!(
        fixture.observer.notifications(),
        &[
            Notification::Mutated(MutationTarget::Entity(fixture.level)),
            Notification::Mutated(MutationTarget::Entity(fixture.level)),
        ]
    );

    let response = fixture.run(
        "remove_capability",
        json!({ "target": "Level", "capability": "Transform" }),
    );
    assert_eq!(error_kind(&response), ErrorKind::HostOperationFailed);
}

#[test]
fn test_read_capabilities_pages_through_the_list() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "read_capabilities",
        json!({ "target": "Player", "page_size": 2, "include_properties": false }),
    );
    let page = response.data.unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["next_cursor"], 2);
    assert_eq!(page["capabilities"][0]["name"], "Transform");
    assert!(page["capabilities"][0].get("properties").is_none());

    let response = fixture.run(
        "read_capabilities",
        json!({ "target": "Player", "page_size": 2, "cursor": 2, "include_hidden": false }),
    );
    let page = response.data.unwrap();
    assert_eq!(page["capabilities"][0]["type"], HEALTH);
    assert_eq!(page["capabilities"][0]["properties"]["current"], 100);
    assert!(page.get("next_cursor").is_none());

    let response = fixture.run("read_capabilities", json!({ "target": "Player", "page_size": 0 }));
    assert_eq!(error_kind(&response), ErrorKind::InvalidArgument);
}

#[test]
fn test_read_single_capability_and_property() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "get_component",
        json!({ "target": "Player", "capability": "Rigidbody" }),
    );
    let data = response.data.unwrap();
    assert_eq!(data["properties"]["mass"], 1.0);
    assert_eq!(data["entity"], json!(fixture.player.0));

    let response = fixture.run(
        "read_capability",
        json!({ "target": "Player", "capability": "Transform", "property": "localscale" }),
    );
    assert_eq!(response.data.unwrap()["value"], json!([1.0, 1.0, 1.0]));

    let response = fixture.run(
        "read_capability",
        json!({ "target": "Level", "capability": "Rigidbody" }),
    );
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
}

#[test]
fn test_create_with_placement_and_capabilities() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "create",
        json!({
            "name": "Crate",
            "parent": "Level",
            "tag": "Prop",
            "layer": "Water",
            "position": [1, 2, 3],
            "capabilities": [{ "type": "Rigidbody", "properties": { "mass": 5 } }]
        }),
    );
    assert!(response.success, "{response:?}");

    let created = fixture.named("Crate")[0];
    let record = fixture.record(created);
    assert_eq!(record.parent, Some(fixture.level));
    assert_eq!(record.tag, "Prop");
    assert_eq!(record.layer, 4);
    assert_eq!(fixture.position(created), [1.0, 2.0, 3.0]);
    assert_eq!(fixture.value(created, RIGIDBODY, "mass"), Value::Float(5.0));
    assert_eq!(fixture.observer.notifications(), &[Notification::Created(created)]);
}

#[test]
fn test_create_destroys_the_entity_when_a_capability_fails() {
    let mut fixture = Fixture::new();
    let before = fixture.scene.len();

    let response = fixture.run(
        "create",
        json!({
            "name": "Broken",
            "capabilities": [
                { "type": "Health" },
                { "type": "Rigidbody", "properties": { "mass": "heavy" } }
            ]
        }),
    );
    assert_eq!(error_kind(&response), ErrorKind::CoercionError);
    assert_eq!(fixture.scene.len(), before);
    assert!(fixture.observer.notifications().is_empty());

    let response = fixture.run(
        "create",
        json!({ "name": "Broken", "capabilities": [{ "type": "Jetpack" }] }),
    );
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert_eq!(fixture.scene.len(), before);
}

#[test]
fn test_modify_record_and_properties() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "modify",
        json!({
            "target": "Player",
            "name": "Hero",
            "active": false,
            "capability_properties": { "Rigidbody": { "mass": 3, "nope": 1 } }
        }),
    );
    assert_eq!(error_kind(&response), ErrorKind::PathError);
    let data = response.data.unwrap();
    assert_eq!(data["applied"], json!([{ "entity": fixture.player.0, "field": "mass" }]));
    assert_eq!(data["failures"][0]["field"], "nope");

    let record = fixture.record(fixture.player);
    assert_eq!(record.name, "Hero");
    assert!(!record.active_self);
    assert_eq!(fixture.value(fixture.player, RIGIDBODY, "mass"), Value::Float(3.0));

    let rigidbody_id = fixture.record(fixture.player).capability(RIGIDBODY).unwrap().id;
    assert_eq!(
        fixture.observer.notifications(),
        &[
            Notification::Mutated(MutationTarget::Entity(fixture.player)),
            Notification::Mutated(MutationTarget::Capability {
                entity:     fixture.player,
                capability: rigidbody_id,
            }),
        ]
    );
}

#[test]
fn test_modify_placement_and_property_map_share_one_notification() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "modify",
        json!({
            "target": "Player",
            "position": "4 5 6",
            "capability_properties": { "Transform": { "localScale": [3, 3, 3] } }
        }),
    );
    assert!(response.success, "{response:?}");
    assert_eq!(fixture.position(fixture.player), [4.0, 5.0, 6.0]);
    assert_eq!(fixture.value(fixture.player, TRANSFORM, "localScale"), Value::Vec3([3.0; 3]));
    assert_eq!(fixture.observer.notifications().len(), 1);
}

#[test]
fn test_modify_reparent_into_own_subtree_is_a_conflict() {
    let mut fixture = Fixture::new();

    let response = fixture.run("modify", json!({ "target": "Level", "parent": "Level/Foo" }));
    assert_eq!(error_kind(&response), ErrorKind::StructuralConflict);
    assert_eq!(fixture.record(fixture.level).parent, None);
    assert!(fixture.observer.notifications().is_empty());

    let response = fixture.run("modify", json!({ "target": "Level/Foo", "parent": null }));
    assert!(response.success, "{response:?}");
    assert_eq!(fixture.record(fixture.foo_child).parent, None);
}

#[test]
fn test_delete_destroys_subtrees_once() {
    let mut fixture = Fixture::new();

    let response = fixture.run("delete", json!({ "target": "Level" }));
    assert!(response.success);
    assert_eq!(response.data.unwrap()["deleted"], json!([fixture.level.0]));
    assert!(fixture.scene.entity(fixture.foo_child).is_none());
    assert_eq!(fixture.observer.notifications(), &[Notification::Destroyed(fixture.level)]);

    let response = fixture.run("delete", json!({ "target": "Level" }));
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
}

#[test]
fn test_duplicate_with_default_name_and_offset() {
    let mut fixture = Fixture::new();
    fixture.run("modify", json!({ "target": "Player", "position": [1, 0, 0] }));
    fixture.observer.clear();

    let response = fixture.run("duplicate", json!({ "target": "Player", "offset": [0, 0, 5] }));
    assert!(response.success, "{response:?}");

    let copy = fixture.named("Player_Copy")[0];
    assert_eq!(fixture.position(copy), [1.0, 0.0, 5.0]);
    assert_eq!(fixture.position(fixture.player), [1.0, 0.0, 0.0]);
    assert_eq!(fixture.value(copy, RIGIDBODY, "mass"), Value::Float(1.0));
    assert_eq!(fixture.observer.notifications(), &[Notification::Created(copy)]);

    let response = fixture.run(
        "duplicate",
        json!({ "target": "Player", "new_name": "Twin", "parent": "Level" }),
    );
    assert!(response.success, "{response:?}");
    let twin = fixture.named("Twin")[0];
    assert_eq!(fixture.record(twin).parent, Some(fixture.level));
}

#[test]
fn test_move_relative_in_reference_frame_and_world_space() {
    let mut fixture = Fixture::new();
    fixture.run(
        "modify",
        json!({ "target": "Player", "position": [10, 0, 0], "rotation": [0, 90, 0] }),
    );

    let response = fixture.run(
        "move_relative",
        json!({ "target": "Level/Foo", "reference": "Player", "direction": "forward", "distance": 2 }),
    );
    assert!(response.success, "{response:?}");
    assert_close(fixture.position(fixture.foo_child), [12.0, 0.0, 0.0]);

    let response = fixture.run(
        "move_relative",
        json!({
            "target": "Level/Foo",
            "reference": "Player",
            "direction": "up",
            "offset": [0, 0, 1],
            "world_space": true
        }),
    );
    assert!(response.success, "{response:?}");
    assert_close(fixture.position(fixture.foo_child), [10.0, 1.0, 1.0]);

    let response = fixture.run(
        "move_relative",
        json!({ "target": "Player", "reference": "Player", "direction": "up" }),
    );
    assert_eq!(error_kind(&response), ErrorKind::InvalidArgument);
}

#[test]
fn test_type_cache_is_filled_by_resolution() {
    let mut fixture = Fixture::new();
    assert!(fixture.probe.type_cache().is_empty());
    fixture.run("find", json!({ "search_term": "Rigidbody", "search_method": "by_component" }));
    assert!(fixture.probe.type_cache().contains(TypeCategory::Capability, "Rigidbody"));
}

fn both_foos(extra: Token) -> Token {
    let mut params = json!({ "target": "Foo", "search_method": "by_name", "find_all": true });
    params
        .as_object_mut()
        .unwrap()
        .extend(extra.as_object().unwrap().clone());
    params
}

#[test]
fn test_remove_capability_checks_every_target_first() {
    let mut fixture = Fixture::new();
    fixture.attach(fixture.foo_child, RIGIDBODY, "Engine", rigidbody());

    let response = fixture.run("remove_capability", both_foos(json!({ "capability": "Rigidbody" })));

    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert!(response.message.contains(&format!("id {}", fixture.foo_root)));
    assert!(fixture.record(fixture.foo_child).has_capability(RIGIDBODY));
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_add_capability_rolls_back_earlier_targets() {
    let mut fixture = Fixture::new();
    let refuse = (fixture.foo_root, RIGIDBODY);

    let response = fixture.run_refusing(
        refuse,
        "add_capability",
        both_foos(json!({ "capability": "Rigidbody", "properties": { "mass": 2 } })),
    );

    assert_eq!(error_kind(&response), ErrorKind::HostOperationFailed);
    assert!(!fixture.record(fixture.foo_child).has_capability(RIGIDBODY));
    assert!(!fixture.record(fixture.foo_root).has_capability(RIGIDBODY));
    assert!(fixture.observer.notifications().is_empty());

    let response = fixture.run(
        "add_capability",
        both_foos(json!({ "capability": "Rigidbody", "properties": { "mass": 2 } })),
    );
    assert!(response.success, "{response:?}");
    assert_eq!(
        response.data.unwrap()["applied"],
        json!([
            { "entity": fixture.foo_child.0, "field": "mass" },
            { "entity": fixture.foo_root.0, "field": "mass" },
        ])
    );
    assert_eq!(fixture.observer.notifications().len(), 2);
}

#[test]
fn test_modify_with_missing_removal_changes_nothing() {
    let mut fixture = Fixture::new();

    let response = fixture.run(
        "modify",
        json!({ "target": "Level", "name": "Renamed", "remove_capabilities": ["Health"] }),
    );

    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert_eq!(fixture.record(fixture.level).name, "Level");
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_modify_checks_removals_on_every_target() {
    let mut fixture = Fixture::new();
    fixture.attach(fixture.foo_child, HEALTH, "Game", health());

    let response = fixture.run(
        "modify",
        both_foos(json!({ "tag": "Enemy", "remove_capabilities": ["Health"] })),
    );

    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert_eq!(fixture.record(fixture.foo_child).tag, "Untagged");
    assert!(fixture.record(fixture.foo_child).has_capability(HEALTH));
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_modify_undoes_attachments_when_a_later_one_is_refused() {
    let mut fixture = Fixture::new();
    let refuse = (fixture.level, HEALTH);

    let response = fixture.run_refusing(
        refuse,
        "modify",
        json!({
            "target": "Level",
            "name": "Renamed",
            "add_capabilities": [{ "type": "Rigidbody" }, { "type": "Health" }]
        }),
    );

    assert_eq!(error_kind(&response), ErrorKind::HostOperationFailed);
    let record = fixture.record(fixture.level);
    assert_eq!(record.name, "Level");
    assert!(!record.has_capability(RIGIDBODY));
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_set_properties_checks_every_target_first() {
    let mut fixture = Fixture::new();
    fixture.attach(fixture.foo_child, RIGIDBODY, "Engine", rigidbody());

    let response = fixture.run(
        "set_capability_properties",
        both_foos(json!({ "capability": "Rigidbody", "properties": { "mass": 9 } })),
    );

    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert_eq!(fixture.value(fixture.foo_child, RIGIDBODY, "mass"), Value::Float(1.0));
    assert!(fixture.observer.notifications().is_empty());
}

#[test]
fn test_batch_failures_name_their_entity() {
    let mut fixture = Fixture::new();
    fixture.attach(fixture.foo_child, INVENTORY, "Game", inventory(&[1, 2]));
    fixture.attach(fixture.foo_root, INVENTORY, "Game", inventory(&[]));

    let response = fixture.run(
        "set_capability_properties",
        both_foos(json!({ "capability": "Inventory", "property": "slots[1]", "value": 5 })),
    );

    assert_eq!(error_kind(&response), ErrorKind::PathError);
    let data = response.data.unwrap();
    assert_eq!(data["applied"], json!([{ "entity": fixture.foo_child.0, "field": "slots[1]" }]));
    assert_eq!(data["failures"].as_array().unwrap().len(), 1);
    assert_eq!(data["failures"][0]["entity"], json!(fixture.foo_root.0));
    assert!(
        response
            .error
            .unwrap()
            .details
            .iter()
            .any(|detail| detail.starts_with(&format!("entity {} slots[1]", fixture.foo_root)))
    );
    assert_eq!(
        fixture.value(fixture.foo_child, INVENTORY, "slots"),
        Value::List(vec![Value::Int(1), Value::Int(5)])
    );
    assert_eq!(fixture.observer.notifications().len(), 1);
}
