//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("retries.max_attempts must be at least 1")]
    NoAttempts,

    #[error("retries.jitter_ratio must be within [0, 1], got {0}")]
    JitterOutOfRange(f64),

    #[error("health_check.{field} must be greater than 0 when the probe is enabled")]
    ZeroProbeDuration { field: &'static str },

    #[error("database.max_connections must be greater than 0")]
    NoConnections,

    #[error("database.url is invalid: {0}")]
    InvalidUrl(String),

    #[error("database.url scheme '{0}' is not supported (expected postgres)")]
    UnsupportedScheme(String),

    #[error("observability.log_format '{0}' is unknown (expected pretty or json)")]
    UnknownLogFormat(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts);
    }
    let jitter = config.retries.jitter_ratio;
    if !(0.0..=1.0).contains(&jitter) {
        errors.push(ValidationError::JitterOutOfRange(jitter));
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroProbeDuration { field: "interval_secs" });
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroProbeDuration { field: "timeout_secs" });
        }
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::NoConnections);
    }
    match Url::parse(&config.database.url) {
        Ok(url) => {
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    let format = config.observability.log_format.as_str();
    if !matches!(format, "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(format.to_string()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
