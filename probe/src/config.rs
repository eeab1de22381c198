//! Session configuration
//!
//! Every field has a default, so an empty JSON object is a complete configuration.

use std::path::{Path, PathBuf};

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DUPLICATE_SUFFIX, DEFAULT_PAGE_SIZE, DEFAULT_SHADER_SIGIL, MAX_PAGE_SIZE,
};
use crate::error::{Error, Result};
use crate::logging::TracingLevel;

const fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

const fn default_max_page_size() -> usize { MAX_PAGE_SIZE }

const fn default_true() -> bool { true }

fn default_shader_sigil() -> String { DEFAULT_SHADER_SIGIL.to_string() }

fn default_duplicate_suffix() -> String { DEFAULT_DUPLICATE_SUFFIX.to_string() }

/// Which capability carries placement, and the names of its members
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformBinding {
    /// Capability type name, short or fully-qualified
    pub capability: String,
    /// Position member (`Vec3`)
    pub position:   String,
    /// Rotation member (Euler angles in degrees, `Vec3`)
    pub rotation:   String,
    /// Scale member (`Vec3`)
    pub scale:      String,
}

impl Default for TransformBinding {
    fn default() -> Self {
        Self {
            capability: "Transform".to_string(),
            position:   "localPosition".to_string(),
            rotation:   "localEulerAngles".to_string(),
            scale:      "localScale".to_string(),
        }
    }
}

/// Tunables for a [`crate::Probe`] session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Capabilities per page when listing without an explicit page size
    #[serde(default = "default_page_size")]
    pub default_page_size:         usize,
    /// Upper bound for requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size:             usize,
    /// Whether hidden serializable fields are listed unless a request says otherwise
    #[serde(default = "default_true")]
    pub include_hidden_by_default: bool,
    /// Prefix that routes a terminal path segment to a material's shader channels
    #[serde(default = "default_shader_sigil")]
    pub shader_sigil:              String,
    /// Placement capability used by create, modify, duplicate and move-relative
    #[serde(default)]
    pub transform:                 TransformBinding,
    /// Appended to the source name when duplicating without a new name
    #[serde(default = "default_duplicate_suffix")]
    pub duplicate_suffix:          String,
    /// Initial tracing level
    #[serde(default)]
    pub log_level:                 TracingLevel,
    /// Trace log location; the temp directory when unset
    #[serde(default)]
    pub log_file:                  Option<PathBuf>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            default_page_size:         DEFAULT_PAGE_SIZE,
            max_page_size:             MAX_PAGE_SIZE,
            include_hidden_by_default: true,
            shader_sigil:              default_shader_sigil(),
            transform:                 TransformBinding::default(),
            duplicate_suffix:          default_duplicate_suffix(),
            log_level:                 TracingLevel::default(),
            log_file:                  None,
        }
    }
}

impl ProbeConfig {
    /// Parse a configuration document
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Report::new(Error::invalid("configuration", e)))?;
        config.validate()
    }

    /// Load a configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| {
                Report::new(Error::invalid("configuration file", e))
                    .attach(format!("Path: {}", path.display()))
            })?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| {
                Report::new(Error::invalid("configuration file", e))
                    .attach(format!("Path: {}", path.display()))
            })?;
        Self::from_value(value)
    }

    fn validate(self) -> Result<Self> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(Report::new(Error::invalid(
                "configuration",
                "page sizes must be positive",
            )));
        }
        if self.default_page_size > self.max_page_size {
            return Err(Report::new(Error::invalid(
                "configuration",
                format!(
                    "default_page_size {} exceeds max_page_size {}",
                    self.default_page_size, self.max_page_size
                ),
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ProbeConfig::from_value(json!({})).unwrap(), ProbeConfig::default());
    }

    #[test]
    fn test_partial_overrides() {
        let config = ProbeConfig::from_value(json!({
            "default_page_size": 10,
            "log_level": "debug",
            "transform": { "position": "position" }
        }))
        .unwrap();
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
        assert_eq!(config.log_level, TracingLevel::Debug);
        assert_eq!(config.transform.position, "position");
        assert_eq!(config.transform.scale, "localScale");
    }

    #[test]
    fn test_inconsistent_page_sizes_are_rejected() {
        assert!(ProbeConfig::from_value(json!({ "default_page_size": 500 })).is_err());
        assert!(ProbeConfig::from_value(json!({ "max_page_size": 0 })).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "duplicate_suffix": " (1)" }}"#).unwrap();
        let config = ProbeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.duplicate_suffix, " (1)");
        assert!(ProbeConfig::from_json_file(file.path().with_extension("missing")).is_err());
    }
}
