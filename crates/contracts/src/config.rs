//! AppConfig - Config Loader output
//!
//! HTTP server, stream engine and logging settings. Every section is
//! optional and falls back to its defaults.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    /// Stream engine settings
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Logging settings
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Body returned by `GET /hello`
    #[serde(default = "default_greeting")]
    #[validate(length(min = 1))]
    pub greeting: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_greeting() -> String {
    "hello".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            greeting: default_greeting(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding; bare IPv6 hosts get brackets
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Stream engine settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Worker pool size for `run_on` stages
    #[serde(default = "default_worker_threads")]
    #[validate(range(min = 1, max = 256))]
    pub worker_threads: usize,

    /// Per-element delay used by the demo scenarios (milliseconds)
    #[serde(default = "default_demo_delay_ms")]
    pub demo_delay_ms: u64,
}

fn default_worker_threads() -> usize {
    4
}

fn default_demo_delay_ms() -> u64 {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            demo_delay_ms: default_demo_delay_ms(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}
