//! Relative includes resolve against each source file's own directory, for
//! explicit and working-directory renderers alike, with conversions in
//! flight concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ramlpipe_convert::{scope::working_directory_lock, Raml2Html};
use ramlpipe_core::{through, Options, PipelineEvent, SourceBody, StreamedFile};
use ramlpipe_renderer::{
    CallbackAdapter, IncludeResolution, ParseError, RamlEngine, RenderConfig, Renderer,
    TeraRenderer,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `count` sibling directories, each with an `api.raml` including its own
/// `title.txt`.
fn fixture(count: usize) -> (TempDir, Vec<PathBuf>) {
    let root = TempDir::new().expect("tempdir");
    let mut sources = Vec::new();
    for i in 0..count {
        let dir = root.path().join(format!("svc{i}"));
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("title.txt"), format!("Service {i}")).expect("write title");
        let source = dir.join("api.raml");
        fs::write(&source, "#%RAML 0.8\ntitle: !include title.txt\n").expect("write raml");
        sources.push(source);
    }
    (root, sources)
}

fn load(sources: &[PathBuf]) -> Vec<StreamedFile> {
    sources
        .iter()
        .map(|path| {
            let bytes = fs::read(path).expect("read");
            StreamedFile::new(path.clone(), bytes)
        })
        .collect()
}

async fn assert_titles(renderer: Arc<dyn Renderer>, count: usize) {
    let (_root, sources) = fixture(count);
    let plugin = Arc::new(Raml2Html::new(Options::default(), renderer));
    let (files, errors) = plugin.process(load(&sources)).await;

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    for (i, source) in sources.iter().enumerate() {
        let html_path = source.with_extension("html");
        let html = files
            .iter()
            .find(|f| f.path == html_path)
            .and_then(|f| f.contents.as_buffer())
            .unwrap_or_else(|| panic!("missing {}", html_path.display()));
        let html = String::from_utf8(html.to_vec()).expect("utf-8");
        assert!(
            html.contains(&format!("<h1>Service {i} API documentation</h1>")),
            "{} rendered with the wrong include",
            source.display()
        );
    }
}

async fn current_dir_locked() -> PathBuf {
    let _lock = working_directory_lock().await;
    std::env::current_dir().expect("cwd")
}

// ---------------------------------------------------------------------------
// Bundled renderer in both include modes
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn explicit_base_dir_keeps_includes_apart() {
    let before = current_dir_locked().await;
    assert_titles(Arc::new(TeraRenderer::new().expect("renderer")), 2).await;
    assert_eq!(current_dir_locked().await, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn working_directory_scope_keeps_includes_apart() {
    let before = current_dir_locked().await;
    let renderer = TeraRenderer::new()
        .expect("renderer")
        .with_include_resolution(IncludeResolution::ProcessCwd);
    assert_titles(Arc::new(renderer), 8).await;
    assert_eq!(current_dir_locked().await, before, "working directory restored");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn callback_renderer_uses_working_directory_scope() {
    let adapter = CallbackAdapter::new(RamlEngine::new().expect("engine"));
    assert_eq!(adapter.include_resolution(), IncludeResolution::ProcessCwd);
    assert_titles(Arc::new(adapter), 4).await;
}

// ---------------------------------------------------------------------------
// The scope spans the whole asynchronous render
// ---------------------------------------------------------------------------

/// Reports the working directory seen before and after suspending.
#[derive(Default)]
struct SlowCwdProbe {
    seen: Mutex<Vec<(PathBuf, PathBuf)>>,
}

#[async_trait]
impl Renderer for SlowCwdProbe {
    async fn render(
        &self,
        _source: SourceBody,
        _config: &RenderConfig,
    ) -> Result<String, ParseError> {
        let start = std::env::current_dir().map_err(|e| ParseError::new(e.to_string()))?;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let end = std::env::current_dir().map_err(|e| ParseError::new(e.to_string()))?;
        self.seen
            .lock()
            .expect("probe lock")
            .push((start.clone(), end));
        Ok(start.display().to_string())
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().expect("canonicalize")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn render_never_observes_another_files_directory() {
    let (_root, sources) = fixture(6);
    let probe = Arc::new(SlowCwdProbe::default());
    let plugin = Arc::new(Raml2Html::new(Options::default(), probe.clone()));
    let (files, errors) = plugin.process(load(&sources)).await;
    assert!(errors.is_empty());

    for (start, end) in probe.seen.lock().expect("probe lock").iter() {
        assert_eq!(start, end, "directory changed mid-render");
    }
    for source in &sources {
        let html = files
            .iter()
            .find(|f| f.path == source.with_extension("html"))
            .and_then(|f| f.contents.as_buffer())
            .expect("output");
        let seen = PathBuf::from(String::from_utf8(html.to_vec()).expect("utf-8"));
        assert_eq!(canonical(&seen), canonical(source.parent().expect("parent")));
    }
}

// ---------------------------------------------------------------------------
// A hung render only hangs its own file
// ---------------------------------------------------------------------------

struct HangsOn(&'static str);

#[async_trait]
impl Renderer for HangsOn {
    async fn render(
        &self,
        source: SourceBody,
        _config: &RenderConfig,
    ) -> Result<String, ParseError> {
        if let SourceBody::Raml(bytes) = &source {
            if bytes.ends_with(self.0.as_bytes()) {
                std::future::pending::<()>().await;
            }
        }
        Ok("done".to_string())
    }

    fn include_resolution(&self) -> IncludeResolution {
        IncludeResolution::Explicit
    }
}

#[tokio::test]
async fn hung_render_does_not_block_other_files() {
    let plugin = Arc::new(Raml2Html::new(Options::default(), Arc::new(HangsOn("hang"))));
    let (tx, mut events) = through(plugin, 4);
    tx.send(StreamedFile::new("slow.raml", "#%RAML 0.8\nhang"))
        .await
        .expect("send");
    tx.send(StreamedFile::new("fast.raml", "#%RAML 0.8\ntitle: x"))
        .await
        .expect("send");
    drop(tx);

    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if let PipelineEvent::Data(file) = event {
                if file.path == PathBuf::from("fast.html") {
                    return true;
                }
            }
        }
        false
    })
    .await
    .expect("fast file finished despite the hung one");
    assert!(found);
}
