//! Plugin options and YAML config loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "ramlpipe.yaml";

/// Options consumed by the converter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Classify valid JSON documents as convertible.
    pub support_json_input: bool,
    /// Forwarded to the renderer config.
    pub https: bool,
}

impl Options {
    /// Load options from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse options from YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}
