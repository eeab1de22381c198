//! Resolve user-supplied type names to concrete type descriptors
//!
//! ## Resolution order
//!
//! 1. Cache hit by fully-qualified name
//! 2. Cache hit by short name, when the input has no namespace separator
//! 3. Direct lookup through the host's qualified-name facility
//! 4. Linear scan of the category, preferred modules first; secondary modules are searched only
//!    when the preferred set has no match at all
//!
//! A scan that finds several candidates in the partition that produced results is an
//! [`Error::Ambiguous`]. The resolver never picks one, and never caches anything for that name.

mod cache;

pub use cache::TypeCache;
use error_stack::Report;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::constants::NAMESPACE_SEPARATOR;
use crate::error::{Error, Result};
use crate::host::TypeCatalog;
use crate::model::{ModuleOrigin, TypeCategory, TypeDescriptor};
use crate::suggest;

/// Name-to-type resolution against a host catalog, backed by a session cache
pub struct TypeResolver<'a> {
    catalog: &'a dyn TypeCatalog,
    cache:   &'a mut TypeCache,
}

impl<'a> TypeResolver<'a> {
    /// Create a resolver for one call; the cache outlives it
    pub fn new(catalog: &'a dyn TypeCatalog, cache: &'a mut TypeCache) -> Self {
        Self { catalog, cache }
    }

    /// Resolve `name` to a single type assignable to `category`
    pub fn resolve(&mut self, name: &str, category: TypeCategory) -> Result<TypeDescriptor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Report::new(Error::missing("type name")));
        }
        let qualified = name.contains(NAMESPACE_SEPARATOR);

        if let Some(hit) = self.cache.get_by_full_name(category, name) {
            debug!("type '{name}' resolved from cache (full name)");
            return Ok(hit.clone());
        }
        if !qualified && let Some(hit) = self.cache.get_by_short_name(category, name) {
            debug!("type '{name}' resolved from cache (short name)");
            return Ok(hit.clone());
        }

        if let Some(direct) = self.catalog.lookup_qualified(name)
            && direct.category.is_assignable_to(category)
        {
            debug!("type '{name}' resolved by direct lookup");
            self.cache.remember(category, &direct);
            return Ok(direct);
        }

        self.scan(name, qualified, category)
    }

    fn scan(&mut self, name: &str, qualified: bool, category: TypeCategory) -> Result<TypeDescriptor> {
        let (preferred, secondary): (Vec<TypeDescriptor>, Vec<TypeDescriptor>) = self
            .catalog
            .types_in_category(category)
            .into_iter()
            .filter(|t| t.category.is_assignable_to(category))
            .filter(|t| t.full_name.as_str() == name || (!qualified && t.short_name() == name))
            .unique_by(|t| (t.full_name.clone(), t.module.clone()))
            .partition(|t| self.catalog.module_origin(&t.module) == ModuleOrigin::Preferred);

        let (origin, mut pool) = if preferred.is_empty() {
            (ModuleOrigin::Secondary, secondary)
        } else {
            (ModuleOrigin::Preferred, preferred)
        };

        match pool.len() {
            0 => Err(Report::new(self.not_found(name, category))),
            1 => {
                let found = pool.remove(0);
                debug!(
                    "type '{name}' resolved by scan to {} ({origin} modules)",
                    found.full_name
                );
                self.cache.remember(category, &found);
                Ok(found)
            },
            count => {
                let candidates: Vec<String> =
                    pool.iter().map(TypeDescriptor::qualified_label).collect();
                warn!("type name '{name}' is ambiguous across {count} {origin} types");
                Err(Report::new(Error::Ambiguous {
                    message: format!(
                        "type name '{name}' matches {count} types: {}. Use a fully-qualified name",
                        candidates.join(", ")
                    ),
                    candidates,
                }))
            },
        }
    }

    fn not_found(&self, name: &str, category: TypeCategory) -> Error {
        let known = self.catalog.types_in_category(category);
        let suggestions = suggest::closest(name, known.iter().map(TypeDescriptor::short_name));
        if suggestions.is_empty() {
            Error::NotFound(format!("type '{name}' ({category}) not found"))
        } else {
            Error::NotFound(format!(
                "type '{name}' ({category}) not found. Did you mean: {}?",
                suggestions.join(", ")
            ))
        }
    }
}
