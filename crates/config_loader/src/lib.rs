//! # Config Loader
//!
//! Reads `AppConfig` from TOML or JSON and validates it before handing it out.
//! A config that fails validation is never returned.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), contracts::ContractError> {
//! let config = ConfigLoader::load_from_path(Path::new("streamlab.toml"))?;
//! println!("Listening on {}", config.server.bind_addr());
//! # Ok(())
//! # }
//! ```

mod parser;
mod validator;

pub use contracts::AppConfig;
pub use parser::ConfigFormat;

use std::path::Path;

use contracts::ContractError;
use tracing::{debug, info};

/// Entry point for loading configuration
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a file, picking the format from its extension
    pub fn load_from_path(path: &Path) -> Result<AppConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&content, format)?;
        info!(path = %path.display(), format = format.name(), "Configuration loaded");
        Ok(config)
    }

    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AppConfig, ContractError> {
        let config = format.parse(content)?;
        validator::validate(&config)?;
        debug!(?config, "Configuration validated");
        Ok(config)
    }

    /// Built-in defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ContractError> {
        path.map_or_else(|| Ok(AppConfig::default()), Self::load_from_path)
    }

    /// Re-check a config after overrides were applied
    pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    pub fn render(config: &AppConfig, format: ConfigFormat) -> Result<String, ContractError> {
        format.render(config)
    }
}
