//! In-memory type catalog

use crate::host::TypeCatalog;
use crate::model::{ModuleOrigin, Object, TypeCategory, TypeDescriptor, TypeName};

/// Type universe built up front from descriptors and default templates
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    modules: Vec<(String, ModuleOrigin)>,
    types:   Vec<(TypeDescriptor, Option<Object>)>,
}

impl MemoryCatalog {
    /// Empty catalog
    pub fn new() -> Self { Self::default() }

    /// Builder: register a module and its partition
    #[must_use]
    pub fn with_module(mut self, name: &str, origin: ModuleOrigin) -> Self {
        self.modules.push((name.to_string(), origin));
        self
    }

    /// Builder: register an attachable type with its default state
    #[must_use]
    pub fn with_capability(self, full_name: &str, module: &str, template: Object) -> Self {
        self.with_type(
            TypeDescriptor::new(full_name, module, TypeCategory::Capability),
            Some(template),
        )
    }

    /// Builder: register a nested value type with its default state
    #[must_use]
    pub fn with_value_type(self, full_name: &str, module: &str, template: Object) -> Self {
        self.with_type(
            TypeDescriptor::new(full_name, module, TypeCategory::Value),
            Some(template),
        )
    }

    /// Builder: register an asset type
    #[must_use]
    pub fn with_resource_type(self, full_name: &str, module: &str) -> Self {
        self.with_type(
            TypeDescriptor::new(full_name, module, TypeCategory::Resource),
            None,
        )
    }

    fn with_type(mut self, descriptor: TypeDescriptor, template: Option<Object>) -> Self {
        self.types.push((descriptor, template));
        self
    }
}

impl TypeCatalog for MemoryCatalog {
    fn lookup_qualified(&self, full_name: &str) -> Option<TypeDescriptor> {
        self.types
            .iter()
            .find(|(descriptor, _)| descriptor.full_name.as_str() == full_name)
            .map(|(descriptor, _)| descriptor.clone())
    }

    fn types_in_category(&self, category: TypeCategory) -> Vec<TypeDescriptor> {
        self.types
            .iter()
            .filter(|(descriptor, _)| descriptor.category.is_assignable_to(category))
            .map(|(descriptor, _)| descriptor.clone())
            .collect()
    }

    fn module_origin(&self, module: &str) -> ModuleOrigin {
        self.modules
            .iter()
            .find(|(name, _)| name == module)
            .map_or(ModuleOrigin::Secondary, |(_, origin)| *origin)
    }

    fn instantiate(&self, type_name: &TypeName) -> Option<Object> {
        self.types
            .iter()
            .find(|(descriptor, _)| &descriptor.full_name == type_name)
            .and_then(|(_, template)| template.clone())
    }
}
