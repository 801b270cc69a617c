//! Error types for ramlpipe-renderer.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Zero-based position inside a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
}

impl Mark {
    pub fn new(line: usize, column: usize) -> Self {
        Mark { line, column }
    }
}

impl fmt::Display for Mark {
    /// One-based `line:column`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A document the renderer rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Where the problem was found, when known.
    pub mark: Option<Mark>,
    /// What the renderer was doing, e.g. `while validating root`.
    pub context: Option<String>,
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            mark: None,
            context: None,
            message: message.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn at(mut self, mark: Option<Mark>) -> Self {
        self.mark = mark;
        self
    }
}

/// Errors from building or running the template engine.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A user template does not replace any embedded template.
    #[error("unknown template {path}")]
    UnknownTemplate { path: PathBuf },

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
