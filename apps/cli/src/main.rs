//! prdocs: documentation bot for pull requests.
//!
//! Listens for GitHub pull-request webhooks and writes AI-generated
//! documentation for every changed file under a local docs directory.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Before parsing and logging, so `.env` can supply PRDOCS_CONFIG and RUST_LOG.
    let env_file = commands::load_env_file(None);

    let cli = Cli::parse();
    commands::init_tracing(&cli);

    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    commands::run(cli).await
}
