//! Constants for parameter names, response fields and defaults
//!
//! This module contains JSON field names, separators and default limits shared across components.

// ============================================================================
// SEPARATORS
// ============================================================================

/// Separator between namespace segments of a type name
pub const NAMESPACE_SEPARATOR: char = '.';

/// Separator between entity names in a hierarchy path
pub const HIERARCHY_SEPARATOR: char = '/';

/// Separator between member segments of a property path
pub const PATH_SEPARATOR: char = '.';

// ============================================================================
// JSON FIELD CONSTANTS
// ============================================================================

/// Key of the shader channel map in serialized objects
pub const RESPONSE_SHADER_PROPERTIES: &str = "shaderProperties";

/// Key of the path inside an object-form resource token
pub const TOKEN_RESOURCE_PATH: &str = "path";

// ============================================================================
// DEFAULTS
// ============================================================================

/// Default page size for capability listings
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Upper bound on page size for capability listings
pub const MAX_PAGE_SIZE: usize = 200;

/// Default prefix of shader parameter names
pub const DEFAULT_SHADER_SIGIL: &str = "_";

/// Default suffix appended to duplicated entity names
pub const DEFAULT_DUPLICATE_SUFFIX: &str = "_Copy";

/// Maximum number of "did you mean" suggestions attached to an error
pub const MAX_SUGGESTIONS: usize = 3;

/// Maximum edit distance for a name to count as a suggestion
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Alpha used when a color token omits its final channel
pub const DEFAULT_COLOR_ALPHA: f32 = 1.0;
