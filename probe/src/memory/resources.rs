//! In-memory asset table

use crate::host::ResourceLookup;
use crate::model::{ResourceHandle, TypeName};

/// Flat list of asset handles
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    handles: Vec<ResourceHandle>,
}

impl MemoryResources {
    /// Empty table
    pub fn new() -> Self { Self::default() }

    /// Builder: register an asset
    #[must_use]
    pub fn with(mut self, handle: ResourceHandle) -> Self {
        self.handles.push(handle);
        self
    }
}

impl ResourceLookup for MemoryResources {
    fn load_by_path(&self, path: &str, expected: &TypeName) -> Option<ResourceHandle> {
        self.handles
            .iter()
            .find(|handle| handle.path == path && &handle.type_name == expected)
            .cloned()
    }

    fn search_by_type_and_name(&self, expected: &TypeName, name: &str) -> Vec<ResourceHandle> {
        self.handles
            .iter()
            .filter(|handle| &handle.type_name == expected && handle.name == name)
            .cloned()
            .collect()
    }
}
