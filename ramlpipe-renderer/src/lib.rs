//! # ramlpipe-renderer
//!
//! The render capability consumed by the converter, plus a bundled
//! Tera-based RAML 0.8 renderer.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ramlpipe_core::SourceBody;
//! use ramlpipe_renderer::{RenderConfig, Renderer, TeraRenderer};
//!
//! async fn render(source: SourceBody) {
//!     if let Ok(renderer) = TeraRenderer::new() {
//!         match renderer.render(source, &RenderConfig::default()).await {
//!             Ok(html) => println!("{} bytes", html.len()),
//!             Err(err) => eprintln!("parse error: {err}"),
//!         }
//!     }
//! }
//! ```

pub mod adapter;
pub mod context;
pub mod document;
pub mod engine;
pub mod error;

pub use adapter::{
    CallbackAdapter, CallbackRenderer, ErrorCallback, IncludeResolution, RenderConfig, Renderer,
    SuccessCallback,
};
pub use context::DocumentContext;
pub use engine::{RamlEngine, TemplateEngine, TeraRenderer};
pub use error::{Mark, ParseError, TemplateError};
