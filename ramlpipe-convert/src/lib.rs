//! # ramlpipe-convert
//!
//! The `raml2html` pipeline plugin: classify incoming files, render RAML (and
//! optionally JSON) documents to HTML, and report failures on the pipeline's
//! error channel.
//!
//! Use [`Raml2Html`] as a [`Plugin`](ramlpipe_core::Plugin) with
//! [`through`](ramlpipe_core::through), or call [`convert`] directly for a
//! single request.

pub mod converter;
pub mod error;
pub mod scope;

pub use converter::{convert, output_path, ConversionRequest, Raml2Html, PLUGIN_NAME};
pub use error::ConversionError;
pub use scope::DirectoryScope;
