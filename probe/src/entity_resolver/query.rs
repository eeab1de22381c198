//! Search strategies and the query they run in

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How a search term is matched against entities
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchStrategy {
    /// Stable id equals the integer term
    ById,
    /// Display name equals the term exactly
    ByName,
    /// `/`-separated name path, relative to the scope root when one is given
    ByPath,
    /// Tag equals the term
    ByTag,
    /// Layer index, or a layer name looked up through the host
    ByLayer,
    /// Carries a capability of the resolved type
    #[serde(alias = "by_capability")]
    #[strum(to_string = "by_component", serialize = "by_capability")]
    ByComponent,
    /// Id, then path, then name; the first strategy with results wins
    #[default]
    ByIdOrNameOrPath,
}

/// A complete entity search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    /// What to look for
    pub term:             String,
    /// How to match it
    pub strategy:         SearchStrategy,
    /// Restrict the search to this entity and its descendants
    pub scope_root:       Option<String>,
    /// Consider entities that are inactive in the hierarchy
    pub include_inactive: bool,
    /// Return every match instead of the first
    pub find_all:         bool,
}

impl EntityQuery {
    /// Query for the first active match
    pub fn new(term: impl Into<String>, strategy: SearchStrategy) -> Self {
        Self {
            term: term.into(),
            strategy,
            scope_root: None,
            include_inactive: false,
            find_all: false,
        }
    }

    /// Builder: return every match
    #[must_use]
    pub const fn find_all(mut self) -> Self {
        self.find_all = true;
        self
    }

    /// Builder: consider inactive entities
    #[must_use]
    pub const fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Builder: restrict to a subtree
    #[must_use]
    pub fn within(mut self, scope_root: impl Into<String>) -> Self {
        self.scope_root = Some(scope_root.into());
        self
    }
}
