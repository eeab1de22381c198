//! A newtype wrapper for fully-qualified type names and the descriptor built around it
//!
//! Type names use `.` as the namespace separator (e.g. `Pkg.Lighting.Light`). The
//! short name is the last segment.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::constants::NAMESPACE_SEPARATOR;

/// Fully-qualified type name used as a map key throughout the crate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Get the underlying string reference
    pub fn as_str(&self) -> &str { &self.0 }

    /// Get the short name (last segment after the namespace separator)
    /// For example: `Pkg.Lighting.Light` returns `Light`
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.0)
    }

    /// Everything before the short name, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0
            .rfind(NAMESPACE_SEPARATOR)
            .map(|pos| &self.0[..pos])
    }

    /// True when the name carries a namespace
    pub fn is_qualified(&self) -> bool { self.0.contains(NAMESPACE_SEPARATOR) }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&String> for TypeName {
    fn from(s: &String) -> Self { Self(s.clone()) }
}

impl From<TypeName> for String {
    fn from(type_name: TypeName) -> Self { type_name.0 }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl From<&TypeName> for Value {
    fn from(type_name: &TypeName) -> Self { Self::String(type_name.0.clone()) }
}

/// Base category a type is assignable to; resolution always happens against one
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    /// Attachable capability (component) types
    Capability,
    /// Managed asset types referenced through handles
    Resource,
    /// Plain value types (structs, enums)
    Value,
    /// Matches every category
    Any,
}

impl TypeCategory {
    /// Whether a type of category `self` satisfies a request for `required`
    pub fn is_assignable_to(self, required: Self) -> bool {
        required == Self::Any || self == required
    }
}

/// Origin partition of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum ModuleOrigin {
    /// The target application's own runtime code, searched first
    Preferred,
    /// Tooling and host modules, searched only when the preferred set has no match
    Secondary,
}

/// Resolved identity of a capability or value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeDescriptor {
    /// Fully-qualified name
    pub full_name: TypeName,
    /// Owning module
    pub module:    String,
    /// Base category the type is assignable to
    pub category:  TypeCategory,
}

impl TypeDescriptor {
    /// Create a descriptor
    pub fn new(
        full_name: impl Into<TypeName>,
        module: impl Into<String>,
        category: TypeCategory,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            module: module.into(),
            category,
        }
    }

    /// Short name of the type
    pub fn short_name(&self) -> &str { self.full_name.short_name() }

    /// `Full.Name (module)` form used in ambiguity listings
    pub fn qualified_label(&self) -> String { format!("{} ({})", self.full_name, self.module) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_and_namespace() {
        let name = TypeName::from("Pkg.Lighting.Light");
        assert_eq!(name.short_name(), "Light");
        assert_eq!(name.namespace(), Some("Pkg.Lighting"));
        assert!(name.is_qualified());

        let bare = TypeName::from("Light");
        assert_eq!(bare.short_name(), "Light");
        assert_eq!(bare.namespace(), None);
    }

    #[test]
    fn test_category_assignability() {
        assert!(TypeCategory::Capability.is_assignable_to(TypeCategory::Any));
        assert!(TypeCategory::Capability.is_assignable_to(TypeCategory::Capability));
        assert!(!TypeCategory::Resource.is_assignable_to(TypeCategory::Capability));
    }
}
