//! ramlpipe core library: streamed-file types, options, classifier, pipeline
//! protocol and errors.
//!
//! Public API surface:
//! - [`types`]: [`StreamedFile`], [`FileContents`], [`SourceBody`]
//! - [`config`]: [`Options`] and YAML loading
//! - [`classify`]: RAML signature sniffing with optional JSON fallback
//! - [`pipeline`]: [`Plugin`], [`Emitter`], [`PipelineEvent`], [`through`]
//! - [`error`]: [`PluginError`], [`ConfigError`]

pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use classify::{classify, Classification};
pub use config::{Options, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, PluginError};
pub use pipeline::{collect, through, Emitter, PipelineEvent, Plugin};
pub use types::{FileContents, SourceBody, StreamedFile};
