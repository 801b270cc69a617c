//! Domain types for files flowing through a build pipeline.
//!
//! All path fields use `PathBuf`. A file's contents are in exactly one of
//! three states, enforced by [`FileContents`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// Boxed readable stream used for streaming-mode contents.
pub type ContentStream = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// Contents of a [`StreamedFile`].
pub enum FileContents {
    /// No contents (directories, files read without contents).
    Null,
    /// Fully buffered bytes.
    Buffer(Bytes),
    /// A readable stream.
    Stream(ContentStream),
}

impl FileContents {
    pub fn is_null(&self) -> bool {
        matches!(self, FileContents::Null)
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, FileContents::Buffer(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, FileContents::Stream(_))
    }

    /// The buffered bytes, if any.
    pub fn as_buffer(&self) -> Option<&Bytes> {
        match self {
            FileContents::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Debug for FileContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContents::Null => f.write_str("Null"),
            FileContents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            FileContents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for FileContents {
    fn from(bytes: Bytes) -> Self {
        FileContents::Buffer(bytes)
    }
}

impl From<Vec<u8>> for FileContents {
    fn from(bytes: Vec<u8>) -> Self {
        FileContents::Buffer(Bytes::from(bytes))
    }
}

impl From<String> for FileContents {
    fn from(text: String) -> Self {
        FileContents::Buffer(Bytes::from(text))
    }
}

impl From<&'static str> for FileContents {
    fn from(text: &'static str) -> Self {
        FileContents::Buffer(Bytes::from_static(text.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// StreamedFile
// ---------------------------------------------------------------------------

/// A file object as passed between pipeline stages.
///
/// `base` and `cwd` are bookkeeping metadata that derived files inherit
/// verbatim.
#[derive(Debug)]
pub struct StreamedFile {
    pub path: PathBuf,
    pub base: PathBuf,
    pub cwd: PathBuf,
    pub contents: FileContents,
}

impl StreamedFile {
    /// A file at `path` with empty `base`/`cwd`.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<FileContents>) -> Self {
        StreamedFile {
            path: path.into(),
            base: PathBuf::new(),
            cwd: PathBuf::new(),
            contents: contents.into(),
        }
    }

    /// Builder-style setter for `base`.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    /// Builder-style setter for `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Create a sibling file sharing `base`/`cwd`, at `path`, with `contents`.
    pub fn derive(&self, path: impl Into<PathBuf>, contents: impl Into<FileContents>) -> Self {
        StreamedFile {
            path: path.into(),
            base: self.base.clone(),
            cwd: self.cwd.clone(),
            contents: contents.into(),
        }
    }

    /// `path` relative to `base`, or `path` itself when it is not under it.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }
}

// ---------------------------------------------------------------------------
// SourceBody
// ---------------------------------------------------------------------------

/// The body handed to a renderer: raw RAML bytes or an already-parsed JSON
/// document. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBody {
    Raml(Bytes),
    Json(serde_json::Value),
}

impl SourceBody {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceBody::Raml(_) => "raml",
            SourceBody::Json(_) => "json",
        }
    }
}
