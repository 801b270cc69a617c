//! Error types for ramlpipe-convert.

use std::path::PathBuf;

use thiserror::Error;

use ramlpipe_renderer::ParseError;

/// All errors the converter reports on the error channel.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Streaming contents were supplied; only buffers are supported.
    #[error("Streams are not supported!")]
    UnsupportedInputMode,

    /// The renderer rejected the document.
    #[error("{}", describe_parse_failure(.path, .error))]
    Parse {
        path: PathBuf,
        #[source]
        error: ParseError,
    },

    /// The renderer panicked before reporting an outcome.
    #[error("{path}: render failed: {reason}")]
    RenderPanicked { path: PathBuf, reason: String },

    /// The working directory could not be switched to the source directory.
    #[error("cannot enter {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Usage errors are fatal for the invocation; the rest are per file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConversionError::UnsupportedInputMode)
    }
}

/// `<path>[:line:column]: Parse error[ context]: <message>`, with a one-based
/// position.
pub fn describe_parse_failure(path: &std::path::Path, error: &ParseError) -> String {
    let position = error.mark.map(|m| format!(":{m}")).unwrap_or_default();
    let context = error
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!(" {c}"))
        .unwrap_or_default();
    format!(
        "{}{position}: Parse error{context}: {}",
        path.display(),
        error.message
    )
}
