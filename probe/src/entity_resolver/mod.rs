//! Locate entities by heterogeneous search criteria
//!
//! ## Pool
//!
//! Without a scope root the pool is every entity the store enumerates. With one, the pool is the
//! root plus its descendants. Either way inactive entities are only present when the query asks
//! for them.
//!
//! ## Ambiguity
//!
//! Unlike type resolution, entity search is permissive: when several entities match and the
//! query does not ask for all of them, the first in enumeration order is returned. Resolving the
//! scope root itself is strict.

mod query;

use error_stack::Report;
use itertools::Itertools;
pub use query::{EntityQuery, SearchStrategy};
use tracing::debug;

use crate::constants::HIERARCHY_SEPARATOR;
use crate::error::{Error, Result};
use crate::host::{EntityStore, TypeCatalog};
use crate::model::{Entity, EntityId, TypeCategory};
use crate::type_resolver::{TypeCache, TypeResolver};

/// Entity search over a store, resolving capability types through the session cache
pub struct EntityResolver<'a> {
    store:   &'a dyn EntityStore,
    catalog: &'a dyn TypeCatalog,
    types:   &'a mut TypeCache,
}

impl<'a> EntityResolver<'a> {
    /// Create a resolver for one call
    pub fn new(
        store: &'a dyn EntityStore,
        catalog: &'a dyn TypeCatalog,
        types: &'a mut TypeCache,
    ) -> Self {
        Self {
            store,
            catalog,
            types,
        }
    }

    /// Every match in enumeration order, deduplicated; the first only unless `find_all`
    ///
    /// No match is an empty list, not an error.
    pub fn find(&mut self, query: &EntityQuery) -> Result<Vec<EntityId>> {
        let term = query.term.trim();
        if term.is_empty() {
            return Err(Report::new(Error::missing("search term")));
        }

        let scope = match &query.scope_root {
            Some(root) => Some(self.resolve_unique(root, query.include_inactive)?),
            None => None,
        };
        let pool = self.pool(scope, query.include_inactive);

        let matches = self.run(query.strategy, term, scope, &pool)?;
        let mut found: Vec<EntityId> = matches.into_iter().unique().collect();
        if !query.find_all {
            found.truncate(1);
        }
        debug!(
            "{} '{term}' matched {} entit{}",
            query.strategy,
            found.len(),
            if found.len() == 1 { "y" } else { "ies" }
        );
        Ok(found)
    }

    /// Like [`EntityResolver::find`], but no match is [`Error::NotFound`]
    pub fn find_required(&mut self, query: &EntityQuery) -> Result<Vec<EntityId>> {
        let found = self.find(query)?;
        if found.is_empty() {
            return Err(Report::new(Error::NotFound(format!(
                "no entity matches '{}' ({})",
                query.term.trim(),
                query.strategy
            ))));
        }
        Ok(found)
    }

    /// Exactly one entity for a reference such as a parent or scope root
    ///
    /// Uses the id, path, name order and fails when the term names several entities.
    pub fn resolve_unique(&mut self, term: &str, include_inactive: bool) -> Result<EntityId> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Report::new(Error::missing("entity reference")));
        }
        let pool = self.store.all_entities(include_inactive);
        let candidates: Vec<EntityId> = self
            .run(SearchStrategy::ByIdOrNameOrPath, term, None, &pool)?
            .into_iter()
            .unique()
            .collect();

        match candidates.as_slice() {
            [] => Err(Report::new(Error::not_found("entity", term))),
            [only] => Ok(*only),
            several => {
                let listed: Vec<String> = several.iter().map(|id| self.label(*id)).collect();
                Err(Report::new(Error::Ambiguous {
                    message:    format!(
                        "'{term}' matches {} entities: {}. Use an id or a path",
                        several.len(),
                        listed.join(", ")
                    ),
                    candidates: listed,
                }))
            },
        }
    }

    fn pool(&self, scope: Option<EntityId>, include_inactive: bool) -> Vec<EntityId> {
        let Some(root) = scope else {
            return self.store.all_entities(include_inactive);
        };
        let mut pool = Vec::new();
        if include_inactive || self.store.is_active_in_hierarchy(root) {
            pool.push(root);
        }
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            let children = self.store.children_of(parent, include_inactive);
            stack.extend(children.iter().rev().copied());
            pool.extend(children);
        }
        pool
    }

    fn run(
        &mut self,
        strategy: SearchStrategy,
        term: &str,
        scope: Option<EntityId>,
        pool: &[EntityId],
    ) -> Result<Vec<EntityId>> {
        match strategy {
            SearchStrategy::ById => {
                let id = parse_id(term).ok_or_else(|| {
                    Report::new(Error::invalid("entity id", format!("'{term}' is not an integer")))
                })?;
                Ok(pool.iter().copied().filter(|entity| *entity == id).collect())
            },
            SearchStrategy::ByName => Ok(self.filter(pool, |entity| entity.name == term)),
            SearchStrategy::ByTag => Ok(self.filter(pool, |entity| entity.tag == term)),
            SearchStrategy::ByPath => Ok(self
                .store
                .find_by_hierarchy_path(term, scope)
                .filter(|entity| pool.contains(entity))
                .into_iter()
                .collect()),
            SearchStrategy::ByLayer => {
                let layer = match term.parse::<u32>() {
                    Ok(index) => index,
                    Err(_) => self
                        .store
                        .layer_by_name(term)
                        .ok_or_else(|| Report::new(Error::not_found("layer", term)))?,
                };
                Ok(self.filter(pool, |entity| entity.layer == layer))
            },
            SearchStrategy::ByComponent => {
                let descriptor = TypeResolver::new(self.catalog, self.types)
                    .resolve(term, TypeCategory::Capability)?;
                Ok(self.filter(pool, |entity| {
                    entity.has_capability(descriptor.full_name.as_str())
                }))
            },
            SearchStrategy::ByIdOrNameOrPath => {
                if parse_id(term).is_some() {
                    let by_id = self.run(SearchStrategy::ById, term, scope, pool)?;
                    if !by_id.is_empty() {
                        return Ok(by_id);
                    }
                }
                if term.contains(HIERARCHY_SEPARATOR) {
                    let by_path = self.run(SearchStrategy::ByPath, term, scope, pool)?;
                    if !by_path.is_empty() {
                        return Ok(by_path);
                    }
                }
                self.run(SearchStrategy::ByName, term, scope, pool)
            },
        }
    }

    fn filter(&self, pool: &[EntityId], predicate: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        pool.iter()
            .copied()
            .filter(|id| self.store.entity(*id).is_some_and(&predicate))
            .collect()
    }

    fn label(&self, id: EntityId) -> String {
        self.store
            .entity(id)
            .map_or_else(|| format!("id {id}"), |entity| format!("{} (id {id})", entity.name))
    }
}

fn parse_id(term: &str) -> Option<EntityId> { term.parse::<i64>().ok().map(EntityId) }

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCatalog, MemoryScene};
    use crate::model::{ModuleOrigin, Object, TypeDescriptor};

    struct Fixture {
        scene:   MemoryScene,
        catalog: MemoryCatalog,
        types:   TypeCache,
        root:    EntityId,
        foo_a:   EntityId,
        foo_b:   EntityId,
        hidden:  EntityId,
    }

    fn fixture() -> Fixture {
        let catalog = MemoryCatalog::new()
            .with_module("Game", ModuleOrigin::Preferred)
            .with_capability("Game.Health", "Game", Object::new("Game.Health"));
        let mut scene = MemoryScene::new().with_layer("Enemies", 9);

        let root = scene.create_entity("Level", None).unwrap();
        let foo_a = scene.create_entity("Foo", Some(root)).unwrap();
        let foo_b = scene.create_entity("Foo", None).unwrap();
        let hidden = scene.create_entity("Ghost", Some(root)).unwrap();
        scene.entity_mut(hidden).unwrap().active_self = false;
        scene.entity_mut(foo_b).unwrap().tag = "Enemy".to_string();
        scene.entity_mut(foo_b).unwrap().layer = 9;
        scene
            .add_capability(
                foo_b,
                TypeDescriptor::new("Game.Health", "Game", TypeCategory::Capability),
                Object::new("Game.Health"),
            )
            .unwrap();

        Fixture {
            scene,
            catalog,
            types: TypeCache::new(),
            root,
            foo_a,
            foo_b,
            hidden,
        }
    }

    fn find(fixture: &mut Fixture, query: &EntityQuery) -> Result<Vec<EntityId>> {
        EntityResolver::new(&fixture.scene, &fixture.catalog, &mut fixture.types).find(query)
    }

    #[test]
    fn test_by_name_first_only_returns_first_in_enumeration_order() {
        let mut fixture = fixture();
        let found = find(&mut fixture, &EntityQuery::new("Foo", SearchStrategy::ByName)).unwrap();
        assert_eq!(found, vec![fixture.foo_a]);
    }

    #[test]
    fn test_by_name_find_all_returns_each_once() {
        let mut fixture = fixture();
        let found = find(
            &mut fixture,
            &EntityQuery::new("Foo", SearchStrategy::ByName).find_all(),
        )
        .unwrap();
        assert_eq!(found, vec![fixture.foo_a, fixture.foo_b]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let mut fixture = fixture();
        let found = find(&mut fixture, &EntityQuery::new("Bar", SearchStrategy::ByName)).unwrap();
        assert!(found.is_empty());
        let report = EntityResolver::new(&fixture.scene, &fixture.catalog, &mut fixture.types)
            .find_required(&EntityQuery::new("Bar", SearchStrategy::ByName))
            .unwrap_err();
        assert!(matches!(report.current_context(), Error::NotFound(_)));
    }

    #[test]
    fn test_scope_root_restricts_pool() {
        let mut fixture = fixture();
        let found = find(
            &mut fixture,
            &EntityQuery::new("Foo", SearchStrategy::ByName)
                .find_all()
                .within("Level"),
        )
        .unwrap();
        assert_eq!(found, vec![fixture.foo_a]);

        let report = find(
            &mut fixture,
            &EntityQuery::new("Foo", SearchStrategy::ByName).within("Nowhere"),
        )
        .unwrap_err();
        assert!(matches!(report.current_context(), Error::NotFound(_)));

        let report = find(
            &mut fixture,
            &EntityQuery::new("Level", SearchStrategy::ByName).within("Foo"),
        )
        .unwrap_err();
        assert!(matches!(report.current_context(), Error::Ambiguous { .. }));
    }

    #[test]
    fn test_inactive_only_when_requested() {
        let mut fixture = fixture();
        let query = EntityQuery::new("Ghost", SearchStrategy::ByName);
        assert!(find(&mut fixture, &query).unwrap().is_empty());
        assert_eq!(
            find(&mut fixture, &query.include_inactive()).unwrap(),
            vec![fixture.hidden]
        );
    }

    #[test]
    fn test_by_path_tag_layer_and_component() {
        let mut fixture = fixture();
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Level/Foo", SearchStrategy::ByPath)).unwrap(),
            vec![fixture.foo_a]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Enemy", SearchStrategy::ByTag)).unwrap(),
            vec![fixture.foo_b]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Enemies", SearchStrategy::ByLayer)).unwrap(),
            vec![fixture.foo_b]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("9", SearchStrategy::ByLayer)).unwrap(),
            vec![fixture.foo_b]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Health", SearchStrategy::ByComponent)).unwrap(),
            vec![fixture.foo_b]
        );

        let report = find(&mut fixture, &EntityQuery::new("Bosses", SearchStrategy::ByLayer))
            .unwrap_err();
        assert!(matches!(report.current_context(), Error::NotFound(_)));
        let report = find(&mut fixture, &EntityQuery::new("Armor", SearchStrategy::ByComponent))
            .unwrap_err();
        assert!(matches!(report.current_context(), Error::NotFound(_)));
    }

    #[test]
    fn test_composite_prefers_id_then_path_then_name() {
        let mut fixture = fixture();
        let id_term = fixture.root.to_string();
        assert_eq!(
            find(&mut fixture, &EntityQuery::new(id_term, SearchStrategy::default())).unwrap(),
            vec![fixture.root]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Level/Foo", SearchStrategy::default()))
                .unwrap(),
            vec![fixture.foo_a]
        );
        assert_eq!(
            find(&mut fixture, &EntityQuery::new("Foo", SearchStrategy::default())).unwrap(),
            vec![fixture.foo_a]
        );
    }

    #[test]
    fn test_by_id_requires_integer() {
        let mut fixture = fixture();
        let report = find(&mut fixture, &EntityQuery::new("abc", SearchStrategy::ById)).unwrap_err();
        assert!(matches!(report.current_context(), Error::InvalidArgument(_)));
    }
}
