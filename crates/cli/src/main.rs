//! # streamlab CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Demo scenario runs with step verification
//! - The `GET /hello` server with graceful shutdown

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use config_loader::ConfigLoader;
use contracts::{AppConfig, LoggingConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_demo, run_info, run_serve, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging settings may come from the config file, so load it first
    let loaded = ConfigLoader::load_or_default(cli.config.as_deref());
    let logging = logging_settings(&cli, loaded.as_ref().ok());
    let metrics_port = (cli.metrics_port != 0).then_some(cli.metrics_port);
    observability::init(&logging, metrics_port)?;

    info!(version = env!("CARGO_PKG_VERSION"), "streamlab starting");

    let config_path = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args, loaded).await,
        Commands::Demo(args) => run_demo(args, loaded).await,
        Commands::Validate(args) => run_validate(args, config_path, loaded),
        Commands::Info(args) => run_info(args, config_path, loaded),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// CLI flags win over the `[logging]` section
fn logging_settings(cli: &Cli, config: Option<&AppConfig>) -> LoggingConfig {
    let configured = config.map(|c| c.logging.clone()).unwrap_or_default();

    let format = cli
        .log_format
        .map(contracts::LogFormat::from)
        .unwrap_or(configured.format);

    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => configured.level,
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    LoggingConfig { format, level }
}
