//! Layered error definitions
//!
//! Categorized by source: flow (stage execution) / config / general

use thiserror::Error;

/// Boxed error returned by user-supplied stage functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal failure of a sequence
///
/// Delivered at most once per subscription, after which nothing else is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A map / filter / zip function returned an error
    #[error("stage '{stage}' failed: {message}")]
    Transform { stage: String, message: String },

    /// A worker task panicked or was lost before reporting
    #[error("worker for stage '{stage}' failed: {message}")]
    Worker { stage: String, message: String },

    /// Subscriber cancelled before completion
    #[error("subscription cancelled")]
    Cancelled,
}

impl FlowError {
    /// Create transform error
    pub fn transform(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create worker error
    pub fn worker(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Worker {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Label of the stage that failed, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Transform { stage, .. } | Self::Worker { stage, .. } => Some(stage),
            Self::Cancelled => None,
        }
    }
}

/// Configuration and general errors
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}
