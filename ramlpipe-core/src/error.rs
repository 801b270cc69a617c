//! Error types for ramlpipe-core.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// An error reported by a pipeline plugin on the error channel.
///
/// The display form is the bare message so downstream consumers can match on
/// it; the plugin name is available through [`PluginError::plugin`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PluginError {
    plugin: &'static str,
    message: String,
    fatal: bool,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl PluginError {
    /// Wrap `source` as a recoverable error tagged with `plugin`.
    pub fn new(plugin: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        PluginError {
            plugin,
            message: source.to_string(),
            fatal: false,
            source: Some(Box::new(source)),
        }
    }

    /// An error carrying only a message.
    pub fn msg(plugin: &'static str, message: impl Into<String>) -> Self {
        PluginError {
            plugin,
            message: message.into(),
            fatal: false,
            source: None,
        }
    }

    /// Mark the error as fatal for the invocation (usage errors).
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Name of the plugin that raised the error.
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Message without the plugin tag.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `true` for usage errors that signal an unsupported invocation.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Borrow the underlying error as a concrete type, if it is one.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_ref().and_then(|s| s.downcast_ref::<E>())
    }
}

/// Errors from loading [`Options`](crate::Options).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`Options`](crate::Options).
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
