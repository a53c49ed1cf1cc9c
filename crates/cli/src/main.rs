//! # Rate Sync CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Settings loading and validation
//! - Rig orchestration and lifecycle
//! - Graceful shutdown on quit key or signal

mod cli;
mod commands;
mod error;
mod pipeline;
mod quit;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::Cli;
use commands::run_rig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging (and metrics) based on CLI options
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port(),
        default_log_level: ObservabilityConfig::level_for(cli.verbose, cli.quiet).to_string(),
        respect_env_filter: !cli.quiet,
        log_file: cli.log_file.clone(),
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "Rate Sync starting");

    let result = run_rig(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
