//! arxivdigest CLI — daily arXiv listings into weekly Markdown digests.
//!
//! Snapshots the daily new-listings page, classifies and enriches the
//! papers, and merges the day's section into its weekly document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
