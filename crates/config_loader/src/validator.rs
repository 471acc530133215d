//! Config validation
//!
//! Rules:
//! - declarative field rules from `#[validate(...)]` on `AppConfig`
//! - server.host has no whitespace and no embedded port
//! - engine.demo_delay_ms <= 60_000

use contracts::{AppConfig, ContractError};
use ::validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

const MAX_DEMO_DELAY_MS: u64 = 60_000;

/// Validate AppConfig
///
/// Returns the first error found, or Ok(()).
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    validate_declared_rules(config)?;
    validate_host(config)?;
    validate_demo_delay(config)?;
    Ok(())
}

fn validate_declared_rules(config: &AppConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error("", &errors)
                .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Walk nested validation errors depth-first, in field-name order
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| (path, describe(e))),
            ValidationErrorsKind::Struct(inner) => first_error(&path, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(&format!("{path}[{idx}]"), inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", error.code),
    }
}

fn validate_host(config: &AppConfig) -> Result<(), ContractError> {
    let host = &config.server.host;
    if host.chars().any(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "server.host",
            format!("host '{host}' must not contain whitespace"),
        ));
    }
    // IPv6 literals carry colons inside brackets
    if !host.starts_with('[') && host.contains(':') && host.parse::<std::net::Ipv6Addr>().is_err()
    {
        return Err(ContractError::config_validation(
            "server.host",
            format!("host '{host}' must not include a port, use server.port"),
        ));
    }
    Ok(())
}

fn validate_demo_delay(config: &AppConfig) -> Result<(), ContractError> {
    if config.engine.demo_delay_ms > MAX_DEMO_DELAY_MS {
        return Err(ContractError::config_validation(
            "engine.demo_delay_ms",
            format!(
                "demo_delay_ms must be <= {MAX_DEMO_DELAY_MS}, got {}",
                config.engine.demo_delay_ms
            ),
        ));
    }
    Ok(())
}
