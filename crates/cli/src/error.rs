//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Requested scenario does not exist
    #[error("Unknown scenario '{name}', available: {available}")]
    UnknownScenario { name: String, available: String },

    /// One or more scenarios produced unexpected output
    #[error("Scenario verification failed: {names}")]
    ScenarioFailed { names: String },

    /// Configuration did not load or validate
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },
}

impl CliError {
    pub fn unknown_scenario(name: impl Into<String>) -> Self {
        Self::UnknownScenario {
            name: name.into(),
            available: verifier::scenarios::names().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn scenario_failed(names: impl Into<String>) -> Self {
        Self::ScenarioFailed {
            names: names.into(),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
