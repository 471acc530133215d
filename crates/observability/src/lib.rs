//! # Observability
//!
//! Log and metric plumbing for streamlab.
//!
//! - `tracing` subscriber driven by the `[logging]` config section
//! - Prometheus exporter for the recorders in [`metrics`]
//!
//! ```ignore
//! observability::init(&config.logging, Some(9000))?;
//! observability::record_subscription_finished(SubscriptionState::Completed);
//! ```

pub mod metrics;

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use contracts::{LogFormat, LoggingConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_element_emitted, record_http_request, record_scenario_duration_ms,
    record_subscription_finished, TimingStats, TimingSummary,
};

/// Install logging, and the metrics exporter when a port is given
pub fn init(logging: &LoggingConfig, metrics_port: Option<u16>) -> Result<()> {
    init_tracing(logging)?;
    if let Some(port) = metrics_port {
        init_metrics(port)?;
    }
    tracing::debug!(
        format = logging.format.as_str(),
        level = %logging.level,
        ?metrics_port,
        "Observability ready"
    );
    Ok(())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides `logging.level` when set.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_names(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_target(false).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter(&logging.level))
        .with(fmt_layer)
        .try_init()
        .context("tracing subscriber already installed")
}

/// Serve Prometheus metrics on `0.0.0.0:port`
pub fn init_metrics(port: u16) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("cannot start metrics exporter on {addr}"))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
