//! Session-owned cache of resolved type names
//!
//! Entries are write-once: once a name resolves, later calls return the cached descriptor even
//! if the host's module set has changed since. The cache lives as long as the session that owns
//! it and is never shared across threads.

use std::collections::HashMap;

use crate::model::{TypeCategory, TypeDescriptor};

/// Resolved descriptors keyed by category plus short or fully-qualified name
#[derive(Debug, Clone, Default)]
pub struct TypeCache {
    by_full_name:  HashMap<(TypeCategory, String), TypeDescriptor>,
    by_short_name: HashMap<(TypeCategory, String), TypeDescriptor>,
}

impl TypeCache {
    /// Empty cache
    pub fn new() -> Self { Self::default() }

    /// Hit by fully-qualified name
    pub fn get_by_full_name(&self, category: TypeCategory, name: &str) -> Option<&TypeDescriptor> {
        self.by_full_name.get(&(category, name.to_string()))
    }

    /// Hit by short name
    pub fn get_by_short_name(&self, category: TypeCategory, name: &str) -> Option<&TypeDescriptor> {
        self.by_short_name.get(&(category, name.to_string()))
    }

    /// Record a resolution under both its short and fully-qualified names
    ///
    /// Existing entries are kept.
    pub fn remember(&mut self, category: TypeCategory, descriptor: &TypeDescriptor) {
        self.by_full_name
            .entry((category, descriptor.full_name.to_string()))
            .or_insert_with(|| descriptor.clone());
        self.by_short_name
            .entry((category, descriptor.short_name().to_string()))
            .or_insert_with(|| descriptor.clone());
    }

    /// Whether `name` has been cached under either key for `category`
    pub fn contains(&self, category: TypeCategory, name: &str) -> bool {
        self.get_by_full_name(category, name).is_some()
            || self.get_by_short_name(category, name).is_some()
    }

    /// Number of distinct fully-qualified entries
    pub fn len(&self) -> usize { self.by_full_name.len() }

    /// True when nothing has been resolved yet
    pub fn is_empty(&self) -> bool { self.by_full_name.is_empty() }
}
