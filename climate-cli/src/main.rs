//! Binary crate for the `climate` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments into form fields
//! - Interactive configuration
//! - Logging setup and printing the rendered display region

use clap::Parser;
use climate_core::Config;
use tracing_subscriber::EnvFilter;

mod cli;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.logging.level);
    cmd.run(config).await
}
