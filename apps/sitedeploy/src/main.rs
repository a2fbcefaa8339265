//! sitedeploy command-line entry point.

mod app;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = app::Cli::parse();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli))
}
