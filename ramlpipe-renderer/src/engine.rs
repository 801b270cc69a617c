//! Tera rendering engine: [`TemplateEngine`], [`RamlEngine`] and the
//! future-style [`TeraRenderer`].
//!
//! # Templates
//!
//! | Name                         | Role                                   |
//! |------------------------------|----------------------------------------|
//! | `index.html.tera`            | Page body, resources and methods       |
//! | `_partials/head.html.tera`   | `<head>`, asset links (http / https)   |
//!
//! A user template directory may override either by its exact relative name;
//! any other `.tera` file there is an error.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tera::Tera;

use ramlpipe_core::SourceBody;

use crate::adapter::{
    CallbackRenderer, ErrorCallback, IncludeResolution, RenderConfig, Renderer, SuccessCallback,
};
use crate::context::DocumentContext;
use crate::document;
use crate::error::{ParseError, TemplateError};

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

/// Entry template rendered for every document.
pub const INDEX_TEMPLATE: &str = "index.html.tera";

const TPLS: &[(&str, &str)] = &[
    (
        "_partials/head.html.tera",
        include_str!("templates/_partials/head.html.tera"),
    ),
    (INDEX_TEMPLATE, include_str!("templates/index.html.tera")),
];

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

const PARTIALS_DIR: &str = "_partials";

/// Read replacements for the embedded templates from `dir`.
///
/// Only the top level and `_partials/` are scanned. Every `.tera` file found
/// must carry the name of an embedded template.
fn read_overrides(dir: &Path) -> Result<Vec<(&'static str, String)>, TemplateError> {
    let io = |path: &Path, source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut overrides = Vec::new();
    for (prefix, sub) in [("", dir.to_path_buf()), ("_partials/", dir.join(PARTIALS_DIR))] {
        if !prefix.is_empty() && !sub.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&sub).map_err(|e| io(&sub, e))? {
            let path = entry.map_err(|e| io(&sub, e))?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || !file_name.ends_with(".tera") {
                continue;
            }
            let name = format!("{prefix}{file_name}");
            let Some(&(known, _)) = TPLS.iter().find(|(n, _)| *n == name) else {
                return Err(TemplateError::UnknownTemplate { path });
            };
            let body = std::fs::read_to_string(&path).map_err(|e| io(&path, e))?;
            overrides.push((known, body));
        }
    }
    Ok(overrides)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, TemplateError> {
    let mut templates: Vec<(&str, String)> =
        TPLS.iter().map(|(name, body)| (*name, (*body).to_string())).collect();
    if let Some(dir) = user_template_dir {
        for (name, body) in read_overrides(dir)? {
            tracing::debug!(template = name, "user template override");
            if let Some(slot) = templates.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = body;
            }
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may replace embedded templates by name.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render the entry template for `ctx`.
    pub fn render(&self, ctx: &DocumentContext) -> Result<String, TemplateError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(INDEX_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// RamlEngine
// ---------------------------------------------------------------------------

/// Synchronous RAML → HTML pipeline: load, resolve includes, validate, render.
pub struct RamlEngine {
    templates: TemplateEngine,
}

impl RamlEngine {
    /// Engine with the embedded templates.
    pub fn new() -> Result<Self, TemplateError> {
        Self::with_templates(None)
    }

    /// Engine with embedded templates overridden from `user_template_dir`.
    pub fn with_templates(user_template_dir: Option<&Path>) -> Result<Self, TemplateError> {
        Ok(RamlEngine {
            templates: TemplateEngine::new(user_template_dir)?,
        })
    }

    /// Render `source`. Includes resolve against `config.base_dir`, or the
    /// process working directory when unset.
    pub fn render_document(
        &self,
        source: &SourceBody,
        config: &RenderConfig,
    ) -> Result<String, ParseError> {
        let base_dir = match &config.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                ParseError::new(format!("cannot determine working directory ({e})"))
                    .with_context("while resolving includes")
            })?,
        };

        let doc = document::load(source, &base_dir)?;
        let ctx = DocumentContext::build(&doc, config)?;
        self.templates.render(&ctx).map_err(|e| {
            ParseError::new(e.to_string()).with_context("while rendering")
        })
    }
}

impl CallbackRenderer for RamlEngine {
    fn render(
        &self,
        source: SourceBody,
        config: &RenderConfig,
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    ) {
        match self.render_document(&source, config) {
            Ok(html) => on_success(html),
            Err(err) => on_error(err),
        }
    }
}

// ---------------------------------------------------------------------------
// TeraRenderer
// ---------------------------------------------------------------------------

/// Future-style renderer over a shared [`RamlEngine`].
///
/// Rendering runs on the blocking pool. Create once and reuse; clones share
/// the engine.
#[derive(Clone)]
pub struct TeraRenderer {
    engine: Arc<RamlEngine>,
    resolution: IncludeResolution,
}

impl TeraRenderer {
    /// Renderer with embedded templates and explicit include resolution.
    pub fn new() -> Result<Self, TemplateError> {
        Ok(Self::from_engine(RamlEngine::new()?))
    }

    pub fn from_engine(engine: RamlEngine) -> Self {
        TeraRenderer {
            engine: Arc::new(engine),
            resolution: IncludeResolution::Explicit,
        }
    }

    /// With [`IncludeResolution::ProcessCwd`] the renderer ignores
    /// `base_dir` and resolves includes against the working directory.
    pub fn with_include_resolution(mut self, resolution: IncludeResolution) -> Self {
        self.resolution = resolution;
        self
    }
}

#[async_trait]
impl Renderer for TeraRenderer {
    async fn render(
        &self,
        source: SourceBody,
        config: &RenderConfig,
    ) -> Result<String, ParseError> {
        let engine = self.engine.clone();
        let mut config = config.clone();
        if self.resolution == IncludeResolution::ProcessCwd {
            config.base_dir = None;
        }

        tokio::task::spawn_blocking(move || engine.render_document(&source, &config))
            .await
            .map_err(|e| ParseError::new(format!("render task failed: {e}")))?
    }

    fn include_resolution(&self) -> IncludeResolution {
        self.resolution
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use tempfile::TempDir;

    fn raml(text: &str) -> SourceBody {
        SourceBody::Raml(Bytes::from(text.to_string()))
    }

    fn config(dir: &TempDir) -> RenderConfig {
        RenderConfig {
            https: false,
            base_dir: Some(dir.path().to_path_buf()),
        }
    }

    #[test]
    fn engine_new_succeeds() {
        RamlEngine::new().expect("RamlEngine::new should succeed with embedded templates");
    }

    #[test]
    fn title_heading_is_rendered() {
        let dir = TempDir::new().unwrap();
        let html = RamlEngine::new()
            .unwrap()
            .render_document(&raml("#%RAML 0.8\ntitle: Example"), &config(&dir))
            .unwrap();
        assert!(html.contains("<h1>Example API documentation</h1>"));
    }

    #[test]
    fn json_source_renders_the_same_heading() {
        let dir = TempDir::new().unwrap();
        let html = RamlEngine::new()
            .unwrap()
            .render_document(&SourceBody::Json(json!({"title": "Example"})), &config(&dir))
            .unwrap();
        assert!(html.contains("<h1>Example API documentation</h1>"));
    }

    #[test]
    fn titles_are_html_escaped() {
        let dir = TempDir::new().unwrap();
        let html = RamlEngine::new()
            .unwrap()
            .render_document(&raml("#%RAML 0.8\ntitle: \"<b>&\""), &config(&dir))
            .unwrap();
        assert!(html.contains("<h1>&lt;b&gt;&amp; API documentation</h1>"));
    }

    #[test]
    fn https_flag_controls_asset_links() {
        let dir = TempDir::new().unwrap();
        let engine = RamlEngine::new().unwrap();
        let source = raml("#%RAML 0.8\ntitle: T");
        let plain = engine.render_document(&source, &config(&dir)).unwrap();
        let secure = engine
            .render_document(
                &source,
                &RenderConfig {
                    https: true,
                    ..config(&dir)
                },
            )
            .unwrap();
        assert!(plain.contains("href=\"http://netdna"));
        assert!(secure.contains("href=\"https://netdna"));
    }

    #[test]
    fn user_templates_override_embedded() {
        let dir = TempDir::new().unwrap();
        let tpl = TempDir::new().unwrap();
        std::fs::write(tpl.path().join("index.html.tera"), "custom {{ title }}").unwrap();
        let engine = RamlEngine::with_templates(Some(tpl.path())).unwrap();
        let html = engine
            .render_document(&raml("#%RAML 0.8\ntitle: X"), &config(&dir))
            .unwrap();
        assert_eq!(html, "custom X");
    }

    #[test]
    fn user_partials_override_embedded() {
        let dir = TempDir::new().unwrap();
        let tpl = TempDir::new().unwrap();
        std::fs::create_dir(tpl.path().join("_partials")).unwrap();
        std::fs::write(tpl.path().join("_partials/head.html.tera"), "<head></head>").unwrap();
        let html = RamlEngine::with_templates(Some(tpl.path()))
            .unwrap()
            .render_document(&raml("#%RAML 0.8\ntitle: X"), &config(&dir))
            .unwrap();
        assert!(html.contains("<head></head>"));
        assert!(!html.contains("netdna"));
    }

    #[test]
    fn unknown_user_templates_are_rejected() {
        let tpl = TempDir::new().unwrap();
        std::fs::write(tpl.path().join("indx.html.tera"), "typo").unwrap();
        std::fs::write(tpl.path().join("notes.txt"), "ignored").unwrap();
        let err = RamlEngine::with_templates(Some(tpl.path())).err().expect("error");
        assert!(matches!(
            err,
            TemplateError::UnknownTemplate { ref path } if path.ends_with("indx.html.tera")
        ));
    }

    #[test]
    fn missing_template_dir_is_an_error() {
        let tpl = TempDir::new().unwrap();
        let err = RamlEngine::with_templates(Some(&tpl.path().join("nope"))).err().expect("error");
        assert!(matches!(err, TemplateError::Io { .. }));
    }

    #[test]
    fn no_crlf_in_rendered_output() {
        let dir = TempDir::new().unwrap();
        let html = RamlEngine::new()
            .unwrap()
            .render_document(&raml("#%RAML 0.8\r\ntitle: T\r\n/a:\r\n  get:\r\n"), &config(&dir))
            .unwrap();
        assert!(!html.contains('\r'));
    }

    #[test]
    fn callback_convention_reports_errors() {
        let dir = TempDir::new().unwrap();
        let engine = RamlEngine::new().unwrap();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();
        CallbackRenderer::render(
            &engine,
            raml("#%RAML 0.8\nfail"),
            &config(&dir),
            Box::new(|_| panic!("unexpected success")),
            Box::new(move |err| *sink.lock().unwrap() = Some(err)),
        );
        let err = seen.lock().unwrap().take().expect("error reported");
        assert_eq!(err.message, "document must be a map");
    }

    #[tokio::test]
    async fn tera_renderer_is_explicit_by_default() {
        let renderer = TeraRenderer::new().unwrap();
        assert_eq!(renderer.include_resolution(), IncludeResolution::Explicit);
        let cwd_bound = renderer.with_include_resolution(IncludeResolution::ProcessCwd);
        assert_eq!(cwd_bound.include_resolution(), IncludeResolution::ProcessCwd);
    }
}
