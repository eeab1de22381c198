//! Error taxonomy shared by every component, and the `Result` alias built on `error_stack`

use error_stack::Report;
use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

// Error message prefixes
const MSG_CANNOT_PREFIX: &str = "Cannot";
const MSG_INVALID_PREFIX: &str = "Invalid";
const MSG_MISSING_PREFIX: &str = "Missing";

/// Result type for the `scene_probe` library
pub type Result<T> = std::result::Result<T, Report<Error>>;

/// Every failure the core can report
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed or missing required input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity, capability, layer or type absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// A name matched more than one candidate where a unique match is required
    #[error("Ambiguous: {message}")]
    Ambiguous {
        /// Human readable summary
        message:    String,
        /// Every candidate, listed once
        candidates: Vec<String>,
    },

    /// A token could not be converted to the target type
    #[error("Cannot convert value for '{field}' to {target}: {reason}")]
    Coercion {
        /// Member or path being written
        field:  String,
        /// Display name of the attempted type
        target: String,
        /// Why the conversion failed
        reason: String,
    },

    /// Malformed or unresolvable member path
    #[error("Invalid path '{path}': {reason}")]
    Path {
        /// The path as supplied by the caller
        path:   String,
        /// Why the path failed
        reason: String,
    },

    /// The request would corrupt the hierarchy
    #[error("Structural conflict: {0}")]
    StructuralConflict(String),

    /// The host refused the underlying graph operation
    #[error("Host operation failed: {0}")]
    HostOperationFailed(String),
}

/// Taxonomy name of an [`Error`], as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
pub enum ErrorKind {
    /// See [`Error::InvalidArgument`]
    InvalidArgument,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::Ambiguous`]
    Ambiguous,
    /// See [`Error::Coercion`]
    CoercionError,
    /// See [`Error::Path`]
    PathError,
    /// See [`Error::StructuralConflict`]
    StructuralConflict,
    /// See [`Error::HostOperationFailed`]
    HostOperationFailed,
}

impl Error {
    /// The taxonomy bucket this error belongs to
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::Coercion { .. } => ErrorKind::CoercionError,
            Self::Path { .. } => ErrorKind::PathError,
            Self::StructuralConflict(_) => ErrorKind::StructuralConflict,
            Self::HostOperationFailed(_) => ErrorKind::HostOperationFailed,
        }
    }

    // Builder methods for common patterns

    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create a "Missing X" error
    pub fn missing(what: &str) -> Self {
        Self::InvalidArgument(format!("{MSG_MISSING_PREFIX} {what}"))
    }

    /// Create a "Cannot X" structural error
    pub fn cannot(action: &str, reason: impl std::fmt::Display) -> Self {
        Self::StructuralConflict(format!("{MSG_CANNOT_PREFIX} {action}: {reason}"))
    }

    /// Create a not-found error for a described target
    pub fn not_found(what: &str, name: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} '{name}' not found"))
    }

    /// Create a coercion error
    pub fn coercion(
        field: impl Into<String>,
        target: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::Coercion {
            field:  field.into(),
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a path error
    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Path {
            path:   path.into(),
            reason: reason.into(),
        }
    }

    /// Create error for a refused host operation
    pub fn host_failed(operation: &str, error: impl std::fmt::Display) -> Self {
        Self::HostOperationFailed(format!("{operation}: {error}"))
    }
}
