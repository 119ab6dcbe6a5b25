//! patrol - Per-file quality checks
//!
//! Routes each changed file to a built-in core plugin, a validated
//! experimental tool, or a fixed per-language check, and reports the outcome
//! live or as a review.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("patrol=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Run the async runtime for commands that need it
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { cli::run(cli).await })
}
