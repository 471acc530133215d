//! `info` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{AppConfig, ContractError};
use serde::Serialize;
use tracing::info;
use verifier::SCENARIOS;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    config_path: String,
    config: &'a AppConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scenarios: Vec<ScenarioInfo>,
}

#[derive(Serialize)]
struct ScenarioInfo {
    name: &'static str,
    description: &'static str,
}

/// Execute the `info` command
pub fn run_info(
    args: &InfoArgs,
    path: Option<&Path>,
    loaded: Result<AppConfig, ContractError>,
) -> Result<()> {
    let config_path = match path {
        Some(path) => path.display().to_string(),
        None => "<defaults>".to_string(),
    };
    info!(config = %config_path, "Loading configuration info");

    let config = loaded.with_context(|| format!("Failed to load config from {config_path}"))?;

    if args.toml {
        let rendered = ConfigLoader::render(&config, ConfigFormat::Toml)?;
        print!("{rendered}");
    } else if args.json {
        let info = build_config_info(config_path, &config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config_path, &config, args);
    }

    Ok(())
}

fn build_config_info<'a>(config_path: String, config: &'a AppConfig, args: &InfoArgs) -> ConfigInfo<'a> {
    let scenarios = if args.scenarios {
        SCENARIOS
            .iter()
            .map(|s| ScenarioInfo {
                name: s.name,
                description: s.description,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        config_path,
        config,
        scenarios,
    }
}

fn print_config_info(config_path: &str, config: &AppConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  streamlab Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📄 Source: {}", config_path);

    println!("\n🌐 Server");
    println!("   ├─ Bind: {}", config.server.bind_addr());
    println!("   └─ Greeting: {}", config.server.greeting);

    println!("\n⚙️  Engine");
    println!("   ├─ Worker threads: {}", config.engine.worker_threads);
    println!("   └─ Demo delay: {} ms", config.engine.demo_delay_ms);

    println!("\n📝 Logging");
    println!("   ├─ Format: {:?}", config.logging.format);
    println!("   └─ Level: {}", config.logging.level);

    if args.scenarios {
        println!("\n🎬 Scenarios ({})", SCENARIOS.len());
        for (i, scenario) in SCENARIOS.iter().enumerate() {
            let prefix = if i == SCENARIOS.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({})", prefix, scenario.name, scenario.description);
        }
    }

    println!();
}
