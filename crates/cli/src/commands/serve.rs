//! `serve` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{AppConfig, ContractError};
use server::{shutdown_signal, HttpServer};
use tracing::info;

use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs, loaded: Result<AppConfig, ContractError>) -> Result<()> {
    let mut config = loaded.context("Failed to load configuration")?;
    apply_overrides(&mut config, args);

    // Overrides bypass the loader's validation
    ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;

    info!(
        addr = %config.server.bind_addr(),
        greeting = %config.server.greeting,
        "Configuration loaded"
    );

    let server = HttpServer::bind(&config.server)
        .await
        .context("Failed to start HTTP server")?;
    info!(addr = %server.local_addr()?, "Serving GET /hello, press Ctrl+C to stop");

    server.serve(shutdown_signal()).await?;

    info!("streamlab server finished");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding server host from CLI");
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding server port from CLI");
        config.server.port = port;
    }
    if let Some(ref greeting) = args.greeting {
        info!(greeting = %greeting, "Overriding greeting from CLI");
        config.server.greeting = greeting.clone();
    }
}
