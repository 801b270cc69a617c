//! `ramlpipe classify`: show which inputs the plugin would convert.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;

use ramlpipe_core::classify;

/// Arguments for `ramlpipe classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Files to inspect.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Treat valid JSON documents as convertible.
    #[arg(long)]
    pub json: bool,
}

impl ClassifyArgs {
    pub fn run(self) -> Result<()> {
        for path in &self.inputs {
            let bytes = std::fs::read(path)
                .map(Bytes::from)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let classification = classify(Some(&bytes), self.json);
            println!("{}\t{}", classification.label(), path.display());
        }
        Ok(())
    }
}
