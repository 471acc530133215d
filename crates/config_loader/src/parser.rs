//! Config file formats
//!
//! TOML is the primary format; JSON is accepted for tooling.

use std::path::Path;

use contracts::{AppConfig, BoxError, ContractError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Case-insensitive match on a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Self::from_extension(ext).ok_or_else(|| {
                ContractError::config_parse(format!("unsupported config format: .{ext}"))
            }),
            None => Err(ContractError::config_parse(format!(
                "{} has no .toml or .json extension",
                path.display()
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Deserialize without validating
    pub fn parse(self, content: &str) -> Result<AppConfig, ContractError> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(|e| Box::new(e) as BoxError),
            Self::Json => serde_json::from_str(content).map_err(|e| Box::new(e) as BoxError),
        };
        parsed.map_err(|e| ContractError::ConfigParse {
            message: format!("{} parse error: {e}", self.name()),
            source: Some(e),
        })
    }

    pub fn render(self, config: &AppConfig) -> Result<String, ContractError> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(|e| ContractError::config_parse(format!("cannot render {}: {e}", self.name())))
    }
}
