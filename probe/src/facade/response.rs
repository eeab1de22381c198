//! Response payloads returned by façade operations

use error_stack::Report;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind};
use crate::model::{CapabilityId, EntityId, TypeName};

/// Structured error as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    /// Taxonomy name
    pub kind:    ErrorKind,
    /// Human readable message
    pub message: String,
    /// Context attached while the error propagated, innermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<&Report<Error>> for ErrorPayload {
    fn from(report: &Report<Error>) -> Self {
        let error = report.current_context();
        let details = report
            .frames()
            .filter_map(|frame| frame.downcast_ref::<String>().cloned())
            .collect();
        Self {
            kind: error.kind(),
            message: error.to_string(),
            details,
        }
    }
}

/// Result of [`crate::Probe::execute`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    /// True when the whole request applied
    pub success: bool,
    /// One-line summary
    pub message: String,
    /// Operation payload; present on success and on partial batch failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data:    Option<Value>,
    /// Present whenever `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:   Option<ErrorPayload>,
}

impl CommandResponse {
    pub(super) fn failure(report: &Report<Error>) -> Self {
        let error = ErrorPayload::from(report);
        Self {
            success: false,
            message: error.message.clone(),
            data:    None,
            error:   Some(error),
        }
    }

    /// Serialize to a JSON value
    pub fn to_json(&self) -> Value { serde_json::to_value(self).unwrap_or(Value::Null) }
}

/// Implemented by every operation result
pub trait Reply: Serialize {
    /// One-line summary of what happened
    fn message(&self) -> String;

    /// Per-field failures of a partially applied request
    fn failures(&self) -> &[FieldFailure] { &[] }
}

/// One property write that applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWrite {
    /// Entity the write landed on
    pub entity: EntityId,
    /// Property path as supplied
    pub field:  String,
}

impl FieldWrite {
    pub(super) fn new(entity: EntityId, field: impl Into<String>) -> Self {
        Self {
            entity,
            field: field.into(),
        }
    }
}

/// One entry of a batch property set that did not apply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    /// Entity the write was aimed at
    pub entity:     EntityId,
    /// Property path as supplied
    pub field:      String,
    /// Capability the path was applied to
    pub capability: TypeName,
    /// Taxonomy name of the failure
    pub kind:       ErrorKind,
    /// Human readable reason
    pub message:    String,
}

impl FieldFailure {
    pub(super) fn new(
        entity: EntityId,
        field: &str,
        capability: &TypeName,
        report: &Report<Error>,
    ) -> Self {
        let error = report.current_context();
        Self {
            entity,
            field: field.to_string(),
            capability: capability.clone(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of applying property maps, across every target entity
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BatchReport {
    /// Fields written, in request order per entity
    pub applied:  Vec<FieldWrite>,
    /// Fields that failed, in request order
    pub failures: Vec<FieldFailure>,
}

impl BatchReport {
    pub(super) fn merge(&mut self, other: Self) {
        self.applied.extend(other.applied);
        self.failures.extend(other.failures);
    }
}

/// Compact description of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    /// Stable id
    pub id:           EntityId,
    /// Display name
    pub name:         String,
    /// `/`-separated path from the root
    pub path:         String,
    /// Tag label
    pub tag:          String,
    /// Layer index
    pub layer:        u32,
    /// Own active flag
    pub active:       bool,
    /// Parent id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent:       Option<EntityId>,
    /// Short names of attached capabilities
    pub capabilities: Vec<String>,
}

/// Result of `find`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindResult {
    /// Matches in enumeration order
    pub entities: Vec<EntitySummary>,
    /// Number of matches
    pub count:    usize,
}

impl Reply for FindResult {
    fn message(&self) -> String { format!("Found {} entit{}", self.count, plural_y(self.count)) }
}

/// One attached capability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityView {
    /// Attachment id
    pub id:         CapabilityId,
    /// Fully-qualified type
    #[serde(rename = "type")]
    pub type_name:  TypeName,
    /// Short type name
    pub name:       String,
    /// Member values, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// Result of `read_capabilities`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityPage {
    /// Entity the capabilities belong to
    pub entity:       EntityId,
    /// This page
    pub capabilities: Vec<CapabilityView>,
    /// Capabilities on the entity
    pub total:        usize,
    /// Offset of the first entry of this page
    pub cursor:       usize,
    /// Offset of the next page, absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor:  Option<usize>,
}

impl Reply for CapabilityPage {
    fn message(&self) -> String {
        format!(
            "Listed {} of {} capabilities on entity {}",
            self.capabilities.len(),
            self.total,
            self.entity
        )
    }
}

/// Result of `read_capability`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityRead {
    /// Entity the capability belongs to
    pub entity:     EntityId,
    /// The capability
    #[serde(flatten)]
    pub capability: CapabilityView,
    /// Path that was read, when only one property was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path:       Option<String>,
    /// Value at `path`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value:      Option<Value>,
}

impl Reply for CapabilityRead {
    fn message(&self) -> String {
        match &self.path {
            Some(path) => format!("Read {}.{path}", self.capability.name),
            None => format!("Read {} on entity {}", self.capability.name, self.entity),
        }
    }
}

/// Result of operations that change entities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    /// What was done, e.g. `Created`
    #[serde(skip)]
    pub verb:     &'static str,
    /// Entities after the change
    pub entities: Vec<EntitySummary>,
    /// Property writes that applied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied:  Vec<FieldWrite>,
    /// Property writes that did not apply
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FieldFailure>,
}

impl Reply for EntityReport {
    fn message(&self) -> String {
        let names: Vec<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        if self.failures.is_empty() {
            format!("{} {}", self.verb, names.join(", "))
        } else {
            format!(
                "{} {} with {} failed field(s)",
                self.verb,
                names.join(", "),
                self.failures.len()
            )
        }
    }

    fn failures(&self) -> &[FieldFailure] { &self.failures }
}

/// Result of `delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Destroyed roots, in request order
    pub deleted: Vec<EntityId>,
    /// Number of destroyed roots
    pub count:   usize,
}

impl Reply for DeleteResult {
    fn message(&self) -> String { format!("Deleted {} entit{}", self.count, plural_y(self.count)) }
}

/// Result of `set_capability_properties`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySetResult {
    /// Entities written
    pub entities:   Vec<EntityId>,
    /// Capability type written
    pub capability: TypeName,
    /// Writes that applied and writes that failed
    #[serde(flatten)]
    pub report:     BatchReport,
}

impl Reply for PropertySetResult {
    fn message(&self) -> String {
        let applied = self.report.applied.len();
        let failed = self.report.failures.len();
        if failed == 0 {
            format!("Set {applied} propert{} on {}", plural_y(applied), self.capability.short_name())
        } else {
            format!(
                "Set {applied} propert{} on {}; {failed} failed",
                plural_y(applied),
                self.capability.short_name()
            )
        }
    }

    fn failures(&self) -> &[FieldFailure] { &self.report.failures }
}

const fn plural_y(count: usize) -> &'static str { if count == 1 { "y" } else { "ies" } }
