//! `ramlpipe build`: run inputs through the raml2html plugin and write every
//! emitted file under the destination directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ramlpipe_convert::Raml2Html;
use ramlpipe_core::{Options, StreamedFile, DEFAULT_CONFIG_FILE};
use ramlpipe_renderer::{RamlEngine, TeraRenderer};

/// Arguments for `ramlpipe build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Files to process.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Destination directory.
    #[arg(long, short, default_value = "target")]
    pub dest: PathBuf,

    /// Also convert files holding valid JSON.
    #[arg(long)]
    pub json: bool,

    /// Link stylesheet assets over https.
    #[arg(long)]
    pub https: bool,

    /// YAML options file (defaults to ./ramlpipe.yaml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of `.tera` templates overriding the embedded ones.
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct BuildSummary {
    written: Vec<PathBuf>,
    rendered: usize,
    failed: usize,
}

impl BuildArgs {
    pub fn run(self) -> Result<()> {
        let options = self.options()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        let summary = runtime.block_on(self.build(options))?;

        for path in &summary.written {
            println!("  ✎  {}", path.display());
        }
        println!(
            "{} {} rendered, {} written",
            "✓".green(),
            summary.rendered,
            summary.written.len()
        );

        if summary.failed > 0 {
            bail!("{} file(s) failed to convert", summary.failed);
        }
        Ok(())
    }

    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Options::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
                .context("failed to load default config")?,
        };
        options.support_json_input |= self.json;
        options.https |= self.https;
        tracing::debug!(
            json = options.support_json_input,
            https = options.https,
            "build options"
        );
        Ok(options)
    }

    async fn build(&self, options: Options) -> Result<BuildSummary> {
        let engine = RamlEngine::with_templates(self.templates.as_deref())
            .context("failed to load templates")?;
        let renderer = Arc::new(TeraRenderer::from_engine(engine));
        let plugin = Arc::new(Raml2Html::new(options, renderer));

        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for path in &self.inputs {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            inputs.push(StreamedFile::new(path.clone(), bytes).with_base(base).with_cwd(&cwd));
        }
        let input_count = inputs.len();
        tracing::debug!(inputs = input_count, dest = %self.dest.display(), "starting build");

        let (files, errors) = plugin.process(inputs).await;

        let mut summary = BuildSummary {
            rendered: files.len().saturating_sub(input_count),
            failed: errors.len(),
            ..BuildSummary::default()
        };
        for err in &errors {
            eprintln!("{} {}", "error:".red().bold(), err);
        }
        for file in &files {
            if let Some(path) = write_dest(&self.dest, file)? {
                tracing::debug!(path = %path.display(), "wrote");
                summary.written.push(path);
            }
        }
        Ok(summary)
    }
}

/// Write `file` to `dest/<path relative to base>`. Files without buffered
/// contents are skipped.
fn write_dest(dest: &Path, file: &StreamedFile) -> Result<Option<PathBuf>> {
    let Some(bytes) = file.contents.as_buffer() else {
        return Ok(None);
    };
    let target = dest.join(file.relative());
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&target, bytes).with_context(|| format!("failed to write {}", target.display()))?;
    Ok(Some(target))
}
