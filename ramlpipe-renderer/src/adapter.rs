//! The render capability and its two calling conventions.
//!
//! [`Renderer`] is the one interface the converter talks to. Renderers
//! written against the older callback convention implement
//! [`CallbackRenderer`] and are wrapped in a [`CallbackAdapter`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use ramlpipe_core::SourceBody;

use crate::error::ParseError;

/// Configuration handed to every render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Link external assets over https.
    pub https: bool,
    /// Directory relative includes resolve against. `None` means the
    /// process working directory.
    pub base_dir: Option<PathBuf>,
}

/// How a renderer resolves relative includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeResolution {
    /// Honors [`RenderConfig::base_dir`].
    Explicit,
    /// Ignores `base_dir` and resolves against the process working
    /// directory, which the caller must set for the duration of the call.
    ProcessCwd,
}

/// Future-style render capability.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `source` to HTML.
    async fn render(&self, source: SourceBody, config: &RenderConfig)
        -> Result<String, ParseError>;

    /// Include resolution strategy. Renderers that cannot take a base
    /// directory keep the default.
    fn include_resolution(&self) -> IncludeResolution {
        IncludeResolution::ProcessCwd
    }
}

pub type SuccessCallback = Box<dyn FnOnce(String) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(ParseError) + Send>;

/// Callback-style render capability.
///
/// Implementations call exactly one of the callbacks, now or later, from any
/// thread.
pub trait CallbackRenderer: Send + Sync {
    fn render(
        &self,
        source: SourceBody,
        config: &RenderConfig,
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    );
}

/// Exposes a [`CallbackRenderer`] as a [`Renderer`].
///
/// Only the first callback invocation counts. If the wrapped renderer drops
/// both callbacks without calling either, the render fails.
pub struct CallbackAdapter<R> {
    inner: R,
    resolution: IncludeResolution,
}

impl<R: CallbackRenderer> CallbackAdapter<R> {
    pub fn new(inner: R) -> Self {
        CallbackAdapter {
            inner,
            resolution: IncludeResolution::ProcessCwd,
        }
    }

    pub fn with_include_resolution(mut self, resolution: IncludeResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

type Slot = Arc<Mutex<Option<oneshot::Sender<Result<String, ParseError>>>>>;

fn settle(slot: &Slot, outcome: Result<String, ParseError>) {
    let Ok(mut guard) = slot.lock() else { return };
    if let Some(tx) = guard.take() {
        let _ = tx.send(outcome);
    }
}

#[async_trait]
impl<R: CallbackRenderer> Renderer for CallbackAdapter<R> {
    async fn render(
        &self,
        source: SourceBody,
        config: &RenderConfig,
    ) -> Result<String, ParseError> {
        let (tx, rx) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(tx)));
        let ok_slot = slot.clone();
        let err_slot = slot;

        self.inner.render(
            source,
            config,
            Box::new(move |html| settle(&ok_slot, Ok(html))),
            Box::new(move |err| settle(&err_slot, Err(err))),
        );

        rx.await.unwrap_or_else(|_| {
            Err(ParseError::new(
                "renderer finished without reporting an outcome",
            ))
        })
    }

    fn include_resolution(&self) -> IncludeResolution {
        self.resolution
    }
}
