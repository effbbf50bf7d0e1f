//! Entry point for the zipserve binary.

use anyhow::Result;
use clap::Parser;

use zipserve::Cli;
use zipserve::server;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;

    // Quiet mode installs no subscriber at all, so every event is dropped.
    if !config.quiet {
        server::init_tracing();
    }

    server::run(config).await
}
