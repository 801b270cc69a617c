//! The `raml2html` plugin.
//!
//! ## Per-file protocol
//!
//! 1. Streaming contents → fatal [`ConversionError::UnsupportedInputMode`].
//! 2. Classify the buffer (RAML signature, then optional JSON fallback).
//! 3. Forward the original file, always.
//! 4. Convertible files: render in a spawned task, yield once, then push the
//!    `.html` file or report the error. Exactly one outcome per file, even
//!    when the renderer panics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ramlpipe_core::{
    classify, pipeline, Emitter, FileContents, Options, Plugin, PluginError, SourceBody,
    StreamedFile,
};
use ramlpipe_renderer::{IncludeResolution, RenderConfig, Renderer, TemplateError, TeraRenderer};

use crate::error::ConversionError;
use crate::scope::{working_directory_lock, DirectoryScope};

/// Name used to tag every error this plugin reports.
pub const PLUGIN_NAME: &str = "raml2html";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One render job, created per convertible file.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub source_body: SourceBody,
    pub https: bool,
}

/// `path` with its final extension replaced by `.html`.
pub fn output_path(path: &Path) -> PathBuf {
    path.with_extension("html")
}

/// Absolute directory containing `path`. Resolved under the working-directory
/// lock so a concurrent scope cannot skew it.
async fn source_dir(path: &Path) -> Result<PathBuf, ConversionError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if parent.is_absolute() {
        return Ok(parent.to_path_buf());
    }
    let _lock = working_directory_lock().await;
    let cwd = std::env::current_dir().map_err(|source| ConversionError::Directory {
        path: parent.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(parent))
}

/// Render one request, scoping include resolution to the source directory.
///
/// Renderers reporting [`IncludeResolution::Explicit`] get the directory in
/// [`RenderConfig::base_dir`]; the rest run inside a [`DirectoryScope`] that is
/// restored as soon as the render resolves.
pub async fn convert(
    renderer: &dyn Renderer,
    request: ConversionRequest,
) -> Result<String, ConversionError> {
    let ConversionRequest {
        source_path,
        source_body,
        https,
    } = request;
    let dir = source_dir(&source_path).await?;
    let mut config = RenderConfig {
        https,
        base_dir: None,
    };

    let outcome = match renderer.include_resolution() {
        IncludeResolution::Explicit => {
            config.base_dir = Some(dir);
            renderer.render(source_body, &config).await
        }
        IncludeResolution::ProcessCwd => {
            let scope = DirectoryScope::enter(&dir)
                .await
                .map_err(|source| ConversionError::Directory {
                    path: dir.clone(),
                    source,
                })?;
            let outcome = renderer.render(source_body, &config).await;
            if let Err(err) = scope.restore() {
                tracing::warn!(error = %err, "failed to restore working directory");
            }
            outcome
        }
    };

    outcome.map_err(|error| ConversionError::Parse {
        path: source_path,
        error,
    })
}

fn panic_reason(join: tokio::task::JoinError) -> String {
    if !join.is_panic() {
        return join.to_string();
    }
    let payload = join.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "renderer panicked".to_string())
}

fn plugin_error(err: ConversionError) -> PluginError {
    let fatal = err.is_fatal();
    let err = PluginError::new(PLUGIN_NAME, err);
    if fatal {
        err.fatal()
    } else {
        err
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// RAML → HTML pipeline stage.
pub struct Raml2Html {
    options: Options,
    renderer: Arc<dyn Renderer>,
}

impl Raml2Html {
    pub fn new(options: Options, renderer: Arc<dyn Renderer>) -> Self {
        Raml2Html { options, renderer }
    }

    /// Plugin backed by the bundled [`TeraRenderer`].
    pub fn with_default_renderer(options: Options) -> Result<Self, TemplateError> {
        Ok(Self::new(options, Arc::new(TeraRenderer::new()?)))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run `files` through the plugin and wait for every outcome.
    ///
    /// Returns all emitted files (pass-through and derived) and all errors.
    pub async fn process(
        self: Arc<Self>,
        files: impl IntoIterator<Item = StreamedFile>,
    ) -> (Vec<StreamedFile>, Vec<PluginError>) {
        let (tx, events) = ramlpipe_core::through(self, 16);
        for file in files {
            if tx.send(file).await.is_err() {
                break;
            }
        }
        drop(tx);
        pipeline::collect(events).await
    }
}

impl Plugin for Raml2Html {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn transform(&self, file: StreamedFile, emitter: &Emitter) {
        let streaming = file.contents.is_stream();
        let classification = if streaming {
            None
        } else {
            let c = classify(file.contents.as_buffer(), self.options.support_json_input);
            tracing::debug!(path = %file.path.display(), kind = c.label(), "classified");
            Some(c)
        };

        let job = classification
            .and_then(|c| c.into_source_body())
            .map(|source_body| {
                let request = ConversionRequest {
                    source_path: file.path.clone(),
                    source_body,
                    https: self.options.https,
                };
                let output = file.derive(output_path(&file.path), FileContents::Null);
                (request, output)
            });

        emitter.push(file);

        if streaming {
            emitter.emit_error(plugin_error(ConversionError::UnsupportedInputMode));
            return;
        }
        let Some((request, mut output)) = job else {
            return;
        };

        let renderer = self.renderer.clone();
        let emitter = emitter.clone();
        tokio::spawn(async move {
            let source = request.source_path.clone();
            let kind = request.source_body.kind();
            // A panicking renderer still owes this file an outcome.
            let outcome = tokio::spawn(async move { convert(&*renderer, request).await })
                .await
                .unwrap_or_else(|join| {
                    Err(ConversionError::RenderPanicked {
                        path: source.clone(),
                        reason: panic_reason(join),
                    })
                });
            tokio::task::yield_now().await;

            match outcome {
                Ok(html) => {
                    tracing::info!(
                        source = %source.display(),
                        output = %output.path.display(),
                        kind,
                        bytes = html.len(),
                        "rendered",
                    );
                    output.contents = FileContents::from(html);
                    emitter.push(output);
                }
                Err(err) => {
                    tracing::warn!(source = %source.display(), error = %err, "conversion failed");
                    emitter.emit_error(plugin_error(err));
                }
            }
        });
    }
}
