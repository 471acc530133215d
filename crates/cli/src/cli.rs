//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// streamlab - reactive operator demos and a tiny HTTP endpoint
#[derive(Parser, Debug)]
#[command(
    name = "streamlab",
    author,
    version,
    about = "Reactive-stream operator demos and a GET /hello server",
    long_about = "Runs ordered stream pipelines (concat, filter, zip, map, repeat, delay,\n\
                  worker offload) as named demo scenarios, and serves a single\n\
                  GET /hello endpoint."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAMLAB_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (overrides [logging].format)
    #[arg(long, value_enum, global = true, env = "STREAMLAB_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, global = true, env = "STREAMLAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "STREAMLAB_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve GET /hello until Ctrl+C
    Serve(ServeArgs),

    /// Run the operator demo scenarios
    Demo(DemoArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display effective configuration
    Info(InfoArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Override server host from configuration
    #[arg(long, env = "STREAMLAB_HOST")]
    pub host: Option<String>,

    /// Override server port from configuration
    #[arg(long, env = "STREAMLAB_PORT")]
    pub port: Option<u16>,

    /// Override the /hello greeting
    #[arg(long, env = "STREAMLAB_GREETING")]
    pub greeting: Option<String>,
}

/// Arguments for the `demo` command
#[derive(Parser, Debug, Clone)]
pub struct DemoArgs {
    /// Run only this scenario (default: all)
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Override the per-element delay in milliseconds
    #[arg(long, env = "STREAMLAB_DEMO_DELAY_MS")]
    pub delay_ms: Option<u64>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration as TOML
    #[arg(long, conflicts_with = "json")]
    pub toml: bool,

    /// List the demo scenarios
    #[arg(long)]
    pub scenarios: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
