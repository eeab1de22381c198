//! Parameter structs for façade operations
//!
//! Each struct corresponds to an [`super::Action`] with the same name (minus the `Params` suffix).
//! Entity references accept either a string or an integer id.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as Token};
use strum_macros::{Display, EnumString};

use crate::entity_resolver::{EntityQuery, SearchStrategy};

const fn default_distance() -> f32 { 1.0 }

fn term_from_token<E: serde::de::Error>(token: Token) -> Result<String, E> {
    match token {
        Token::String(text) => Ok(text),
        Token::Number(number) => Ok(number.to_string()),
        other => Err(E::custom(format!(
            "expected an entity name, path or id, got {other}"
        ))),
    }
}

/// Accept a string or an integer as an entity reference
pub fn deserialize_term<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    term_from_token(Token::deserialize(deserializer)?)
}

/// Optional variant of [`deserialize_term`]; `null` is `None`
pub fn deserialize_optional_term<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Token::deserialize(deserializer)? {
        Token::Null => Ok(None),
        token => term_from_token(token).map(Some),
    }
}

/// Distinguish an explicit `null` (move to the root) from an absent field (leave alone)
pub fn deserialize_parent_change<'de, D>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_term(deserializer).map(Some)
}

/// Which entities an operation acts on
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TargetParams {
    /// Entity id, name, path, tag, layer or capability type, depending on `search_method`
    #[serde(alias = "search_term", deserialize_with = "deserialize_term")]
    #[schemars(with = "Token")]
    pub target:           String,
    /// How `target` is matched (default: `by_id_or_name_or_path`)
    #[serde(default)]
    pub search_method:    SearchStrategy,
    /// Restrict the search to this entity and its descendants
    #[serde(default, deserialize_with = "deserialize_optional_term")]
    #[schemars(with = "Option<Token>")]
    pub scope_root:       Option<String>,
    /// Also match entities that are inactive in the hierarchy
    #[serde(default)]
    pub include_inactive: bool,
    /// Act on every match instead of the first
    #[serde(default)]
    pub find_all:         bool,
}

impl From<&TargetParams> for EntityQuery {
    fn from(params: &TargetParams) -> Self {
        let mut query = Self::new(params.target.clone(), params.search_method);
        query.scope_root.clone_from(&params.scope_root);
        query.include_inactive = params.include_inactive;
        query.find_all = params.find_all;
        query
    }
}

/// A capability to attach, with optional initial property values
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CapabilitySpec {
    /// Capability type name, short or fully-qualified
    #[serde(rename = "type", alias = "name")]
    pub type_name:  String,
    /// Property paths and values applied after attaching
    #[serde(default)]
    pub properties: Map<String, Token>,
}

/// Placement values written through the configured transform capability
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct PlacementParams {
    /// Position, any vector token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Token>,
    /// Euler angles in degrees, any vector token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Token>,
    /// Scale, any vector token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale:    Option<Token>,
}

impl PlacementParams {
    pub(super) const fn is_empty(&self) -> bool {
        self.position.is_none() && self.rotation.is_none() && self.scale.is_none()
    }
}

/// Parameters for [`super::Probe::find`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FindParams {
    /// What to search for
    #[serde(flatten)]
    pub target: TargetParams,
}

/// Parameters for [`super::Probe::read_capabilities`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ReadCapabilitiesParams {
    /// Entity whose capabilities are listed; the first match is used
    #[serde(flatten)]
    pub target:             TargetParams,
    /// Capabilities per page (default and upper bound come from the configuration)
    #[serde(default)]
    pub page_size:          Option<usize>,
    /// Offset of the first capability to list (default: 0)
    #[serde(default)]
    pub cursor:             usize,
    /// Include member values (default: true)
    #[serde(default)]
    pub include_properties: Option<bool>,
    /// Include hidden serialized fields (default from the configuration)
    #[serde(default)]
    pub include_hidden:     Option<bool>,
}

/// Parameters for [`super::Probe::read_capability`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ReadCapabilityParams {
    /// Entity to read from; the first match is used
    #[serde(flatten)]
    pub target:         TargetParams,
    /// Capability type name, short or fully-qualified
    pub capability:     String,
    /// Read only the value at this member path
    #[serde(default)]
    pub property:       Option<String>,
    /// Include hidden serialized fields (default from the configuration)
    #[serde(default)]
    pub include_hidden: Option<bool>,
}

/// Parameters for [`super::Probe::create`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateParams {
    /// Display name of the new entity
    pub name:         String,
    /// Parent reference; the entity is a root when absent
    #[serde(default, deserialize_with = "deserialize_optional_term")]
    #[schemars(with = "Option<Token>")]
    pub parent:       Option<String>,
    /// Tag label
    #[serde(default)]
    pub tag:          Option<String>,
    /// Layer name or index
    #[serde(default, deserialize_with = "deserialize_optional_term")]
    #[schemars(with = "Option<Token>")]
    pub layer:        Option<String>,
    /// Own active flag (default: true)
    #[serde(default)]
    pub active:       Option<bool>,
    /// Initial placement
    #[serde(flatten)]
    pub placement:    PlacementParams,
    /// Capabilities attached after creation, in order
    #[serde(default)]
    pub capabilities: Vec<CapabilitySpec>,
}

/// Parameters for [`super::Probe::modify`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ModifyParams {
    /// Entities to change
    #[serde(flatten)]
    pub target:                TargetParams,
    /// New display name
    #[serde(default)]
    pub name:                  Option<String>,
    /// New tag label
    #[serde(default)]
    pub tag:                   Option<String>,
    /// New layer name or index
    #[serde(default, deserialize_with = "deserialize_optional_term")]
    #[schemars(with = "Option<Token>")]
    pub layer:                 Option<String>,
    /// New own active flag
    #[serde(default)]
    pub active:                Option<bool>,
    /// New parent reference; `null` moves the entity to the root
    #[serde(default, deserialize_with = "deserialize_parent_change")]
    #[schemars(with = "Option<Token>")]
    pub parent:                Option<Option<String>>,
    /// New placement
    #[serde(flatten)]
    pub placement:             PlacementParams,
    /// Capabilities to attach
    #[serde(default)]
    pub add_capabilities:      Vec<CapabilitySpec>,
    /// Capability type names to detach; every target must carry each of them
    #[serde(default)]
    pub remove_capabilities:   Vec<String>,
    /// Capability type name to a map of property paths and values
    #[serde(default)]
    pub capability_properties: Map<String, Token>,
}

/// Parameters for [`super::Probe::delete`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DeleteParams {
    /// Entities to destroy, subtrees included
    #[serde(flatten)]
    pub target: TargetParams,
}

/// Parameters for [`super::Probe::duplicate`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DuplicateParams {
    /// Entity to copy; the first match is used
    #[serde(flatten)]
    pub target:   TargetParams,
    /// Name of the copy (default: source name plus the configured suffix)
    #[serde(default)]
    pub new_name: Option<String>,
    /// Absolute position of the copy
    #[serde(default)]
    pub position: Option<Token>,
    /// Added to the copy's position
    #[serde(default)]
    pub offset:   Option<Token>,
    /// New parent reference; `null` moves the copy to the root
    #[serde(default, deserialize_with = "deserialize_parent_change")]
    #[schemars(with = "Option<Token>")]
    pub parent:   Option<Option<String>>,
}

/// Parameters for [`super::Probe::add_capability`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AddCapabilityParams {
    /// Entities to attach to
    #[serde(flatten)]
    pub target:     TargetParams,
    /// Capability type name, short or fully-qualified
    pub capability: String,
    /// Initial property values; any failure detaches the capability again
    #[serde(default)]
    pub properties: Map<String, Token>,
}

/// Parameters for [`super::Probe::remove_capability`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RemoveCapabilityParams {
    /// Entities to detach from
    #[serde(flatten)]
    pub target:     TargetParams,
    /// Capability type name, short or fully-qualified
    pub capability: String,
}

/// Parameters for [`super::Probe::set_capability_properties`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SetCapabilityPropertiesParams {
    /// Entities to write
    #[serde(flatten)]
    pub target:     TargetParams,
    /// Capability type name, short or fully-qualified
    pub capability: String,
    /// Property paths and values, applied independently in order
    #[serde(default)]
    pub properties: Map<String, Token>,
    /// Single property path, combined with `value`
    #[serde(default)]
    pub property:   Option<String>,
    /// Value for `property`
    #[serde(default)]
    pub value:      Option<Token>,
}

impl SetCapabilityPropertiesParams {
    /// `properties` followed by the single `property`/`value` pair, if given
    pub(super) fn entries(&self) -> Map<String, Token> {
        let mut entries = self.properties.clone();
        if let Some(property) = &self.property {
            entries.insert(property.clone(), self.value.clone().unwrap_or(Token::Null));
        }
        entries
    }
}

/// Direction of a relative move
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    /// Negative x
    Left,
    /// Positive x
    Right,
    /// Positive y
    Up,
    /// Negative y
    Down,
    /// Positive z
    Forward,
    /// Negative z
    #[serde(alias = "backward")]
    #[strum(to_string = "back", serialize = "backward")]
    Back,
}

impl Direction {
    /// Unit axis in the reference frame
    pub const fn axis(self) -> [f32; 3] {
        match self {
            Self::Left => [-1.0, 0.0, 0.0],
            Self::Right => [1.0, 0.0, 0.0],
            Self::Up => [0.0, 1.0, 0.0],
            Self::Down => [0.0, -1.0, 0.0],
            Self::Forward => [0.0, 0.0, 1.0],
            Self::Back => [0.0, 0.0, -1.0],
        }
    }
}

/// Parameters for [`super::Probe::move_relative`]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct MoveRelativeParams {
    /// Entities to move
    #[serde(flatten)]
    pub target:      TargetParams,
    /// Entity the move is relative to; must resolve uniquely
    #[serde(deserialize_with = "deserialize_term")]
    #[schemars(with = "Token")]
    pub reference:   String,
    /// Direction from the reference
    pub direction:   Direction,
    /// Distance along `direction` (default: 1)
    #[serde(default = "default_distance")]
    pub distance:    f32,
    /// Added after the directional move, in the same frame
    #[serde(default)]
    pub offset:      Option<Token>,
    /// Use world axes instead of the reference's rotated axes
    #[serde(default)]
    pub world_space: bool,
}
