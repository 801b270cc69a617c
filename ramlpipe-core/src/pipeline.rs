//! Object-stream protocol between pipeline stages.
//!
//! A stage receives [`StreamedFile`]s and emits zero or more
//! [`PipelineEvent`]s per file through an [`Emitter`]. Emitters are cheap to
//! clone; a plugin that finishes work asynchronously keeps a clone alive in
//! its task, and the event channel only closes once every clone is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::PluginError;
use crate::types::StreamedFile;

/// One item on a stage's output.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A file pushed on the data channel.
    Data(StreamedFile),
    /// An error pushed on the error channel.
    Error(PluginError),
}

impl PipelineEvent {
    pub fn into_file(self) -> Option<StreamedFile> {
        match self {
            PipelineEvent::Data(file) => Some(file),
            PipelineEvent::Error(_) => None,
        }
    }

    pub fn into_error(self) -> Option<PluginError> {
        match self {
            PipelineEvent::Data(_) => None,
            PipelineEvent::Error(err) => Some(err),
        }
    }
}

/// Handle a plugin uses to push files and errors downstream.
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl Emitter {
    /// Create an emitter and the receiving end of its event channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Emitter { tx }, rx)
    }

    /// Push a file on the data channel. Returns `false` if nobody listens.
    pub fn push(&self, file: StreamedFile) -> bool {
        self.send(PipelineEvent::Data(file))
    }

    /// Push an error on the error channel. Returns `false` if nobody listens.
    pub fn emit_error(&self, err: PluginError) -> bool {
        self.send(PipelineEvent::Error(err))
    }

    fn send(&self, event: PipelineEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                tracing::debug!(?event, "pipeline event dropped, receiver closed");
                false
            }
        }
    }
}

/// A pipeline stage.
///
/// `transform` is called once per incoming file, in arrival order. It must not
/// block; asynchronous work is spawned onto the runtime with a cloned
/// [`Emitter`].
pub trait Plugin: Send + Sync + 'static {
    /// Name used to tag errors.
    fn name(&self) -> &'static str;

    /// Handle one file.
    fn transform(&self, file: StreamedFile, emitter: &Emitter);
}

/// Spawn `plugin` as a stage on the current tokio runtime.
///
/// Returns the input sender and the event receiver. Dropping the sender ends
/// the input; the receiver yields `None` once the input has ended and all
/// outstanding asynchronous work of the plugin has finished.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn through<P: Plugin>(
    plugin: Arc<P>,
    capacity: usize,
) -> (
    mpsc::Sender<StreamedFile>,
    mpsc::UnboundedReceiver<PipelineEvent>,
) {
    let (input_tx, mut input_rx) = mpsc::channel::<StreamedFile>(capacity.max(1));
    let (emitter, events) = Emitter::channel();

    tokio::spawn(async move {
        let mut seen = 0usize;
        while let Some(file) = input_rx.recv().await {
            seen += 1;
            plugin.transform(file, &emitter);
        }
        tracing::debug!(plugin = plugin.name(), files = seen, "stage input ended");
    });

    (input_tx, events)
}

/// Drain an event receiver to completion, splitting files from errors.
pub async fn collect(
    mut events: mpsc::UnboundedReceiver<PipelineEvent>,
) -> (Vec<StreamedFile>, Vec<PluginError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Data(file) => files.push(file),
            PipelineEvent::Error(err) => errors.push(err),
        }
    }
    (files, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileContents;
    use std::path::PathBuf;

    struct Echo;

    impl Plugin for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn transform(&self, file: StreamedFile, emitter: &Emitter) {
            if file.contents.is_null() {
                emitter.emit_error(PluginError::msg(self.name(), "empty"));
            }
            emitter.push(file);
        }
    }

    struct Delayed;

    impl Plugin for Delayed {
        fn name(&self) -> &'static str {
            "delayed"
        }

        fn transform(&self, file: StreamedFile, emitter: &Emitter) {
            let late = file.derive(file.path.with_extension("late"), FileContents::Null);
            emitter.push(file);
            let emitter = emitter.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                emitter.push(late);
            });
        }
    }

    #[tokio::test]
    async fn through_forwards_in_order_and_closes() {
        let (tx, rx) = through(Arc::new(Echo), 4);
        tx.send(StreamedFile::new("a", "1")).await.expect("send");
        tx.send(StreamedFile::new("b", FileContents::Null)).await.expect("send");
        drop(tx);

        let (files, errors) = collect(rx).await;
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].plugin(), "echo");
    }

    #[tokio::test]
    async fn channel_stays_open_for_spawned_work() {
        let (tx, rx) = through(Arc::new(Delayed), 1);
        tx.send(StreamedFile::new("x.raml", "1")).await.expect("send");
        drop(tx);

        let (files, _) = collect(rx).await;
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.path == PathBuf::from("x.late")));
    }

    #[test]
    fn emitter_reports_closed_receiver() {
        let (emitter, rx) = Emitter::channel();
        drop(rx);
        assert!(!emitter.push(StreamedFile::new("a", FileContents::Null)));
    }

    #[test]
    fn event_accessors() {
        let data = PipelineEvent::Data(StreamedFile::new("a", FileContents::Null));
        assert!(data.into_file().is_some());
        let err = PipelineEvent::Error(PluginError::msg("p", "m"));
        assert_eq!(err.into_error().map(|e| e.to_string()), Some("m".to_string()));
    }
}
