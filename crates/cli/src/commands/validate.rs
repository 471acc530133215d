//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{AppConfig, ContractError};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Outcome of a validation run, as printed with `--json`
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Validation {
    Valid {
        config_path: String,
        summary: ConfigSummary,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Invalid {
        config_path: String,
        error: String,
    },
}

#[derive(Serialize)]
struct ConfigSummary {
    bind_addr: String,
    greeting: String,
    worker_threads: usize,
    demo_delay_ms: u64,
    log_format: &'static str,
    log_level: String,
}

impl From<&AppConfig> for ConfigSummary {
    fn from(config: &AppConfig) -> Self {
        Self {
            bind_addr: config.server.bind_addr(),
            greeting: config.server.greeting.clone(),
            worker_threads: config.engine.worker_threads,
            demo_delay_ms: config.engine.demo_delay_ms,
            log_format: config.logging.format.as_str(),
            log_level: config.logging.level.clone(),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(
    args: &ValidateArgs,
    path: Option<&Path>,
    loaded: Result<AppConfig, ContractError>,
) -> Result<()> {
    let config_path = describe_path(path);
    info!(config = %config_path, "Validating configuration");

    let validation = validate(config_path, loaded);

    if args.json {
        let json = serde_json::to_string_pretty(&validation)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation(&validation);
    }

    match validation {
        Validation::Valid { .. } => Ok(()),
        Validation::Invalid { error, .. } => Err(CliError::config_validation(error).into()),
    }
}

fn describe_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string())
}

fn validate(config_path: String, loaded: Result<AppConfig, ContractError>) -> Validation {
    match loaded {
        Ok(config) => Validation::Valid {
            config_path,
            summary: ConfigSummary::from(&config),
            warnings: collect_warnings(&config),
        },
        Err(e) => Validation::Invalid {
            config_path,
            error: e.to_string(),
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.server.port < 1024 {
        warnings.push(format!(
            "server.port {} is privileged and may need elevated permissions",
            config.server.port
        ));
    }

    if config.server.host == "0.0.0.0" || config.server.host == "::" {
        warnings.push("server listens on all interfaces".to_string());
    }

    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if config.engine.worker_threads > cores * 10 {
        warnings.push(format!(
            "engine.worker_threads {} exceeds 10x the {} available cores",
            config.engine.worker_threads, cores
        ));
    }

    if config.engine.demo_delay_ms == 0 {
        warnings.push("engine.demo_delay_ms is 0 - delayed scenarios emit without spacing".to_string());
    }

    warnings
}

fn print_validation(validation: &Validation) {
    match validation {
        Validation::Valid {
            config_path,
            summary,
            warnings,
        } => {
            println!("✓ {config_path} is valid");
            println!("  listen   {} (greeting {:?})", summary.bind_addr, summary.greeting);
            println!(
                "  engine   {} workers, {} ms demo delay",
                summary.worker_threads, summary.demo_delay_ms
            );
            println!("  logging  {} at {}", summary.log_format, summary.log_level);
            for warning in warnings {
                println!("⚠ {warning}");
            }
        }
        Validation::Invalid { config_path, error } => {
            println!("✗ {config_path} is invalid");
            println!("  {error}");
        }
    }
}
