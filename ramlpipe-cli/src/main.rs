//! ramlpipe: render RAML API descriptions to HTML.
//!
//! # Usage
//!
//! ```text
//! ramlpipe build <inputs>... [--dest <dir>] [--json] [--https] [--config <file>] [--templates <dir>]
//! ramlpipe classify <inputs>... [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{build::BuildArgs, classify::ClassifyArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ramlpipe",
    version,
    about = "Render RAML API descriptions to HTML documentation",
    long_about = None,
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert RAML (and optionally JSON) files, copying every input to the
    /// destination alongside the rendered HTML.
    Build(BuildArgs),

    /// Print how each input would be treated: raml, json or skip.
    Classify(ClassifyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Build(args) => args.run(),
        Commands::Classify(args) => args.run(),
    }
}
