//! Error types for the validation service.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
}

/// Structural validation failures detected before the pipeline runs
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    Multiple(String),
}

/// Failures reported by external collaborators such as the fraud engine
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// Parse an optional setting. Unset or empty values yield `None`; values
/// that are set but malformed are rejected.
pub fn parse_setting<T>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) if !value.is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("'{value}': {e}"),
                })
        }
        _ => Ok(None),
    }
}

impl AppError {
    /// Short machine-readable label, used for error metrics and response bodies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ExternalService(ExternalServiceError::Timeout(_)) => "timeout",
            Self::ExternalService(_) => "external_service_error",
            Self::Config(_) => "configuration_error",
            Self::Serialization(_) => "serialization_error",
            Self::Internal(_) => "internal_error",
            Self::RateLimited => "rate_limited",
            Self::PayloadTooLarge(_) => "payload_too_large",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_labels() {
        let err = AppError::from(ValidationError::Multiple("bad".to_string()));
        assert_eq!(err.kind(), "validation_error");

        let err = AppError::from(ExternalServiceError::Timeout("slow".to_string()));
        assert_eq!(err.kind(), "timeout");

        let err = AppError::from(ExternalServiceError::Unavailable("down".to_string()));
        assert_eq!(err.kind(), "external_service_error");

        assert_eq!(AppError::Internal("x".to_string()).kind(), "internal_error");
        assert_eq!(AppError::RateLimited.kind(), "rate_limited");
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!(parse_setting::<u64>("X", None).unwrap(), None);
        assert_eq!(parse_setting::<u64>("X", Some(String::new())).unwrap(), None);
        assert_eq!(parse_setting::<u64>("X", Some("12".into())).unwrap(), Some(12));

        let err = parse_setting::<u64>("FRAUD_ENGINE_TIMEOUT_SECS", Some("abc".into()))
            .unwrap_err();
        let ConfigError::InvalidValue { name, message } = err;
        assert_eq!(name, "FRAUD_ENGINE_TIMEOUT_SECS");
        assert!(message.contains("abc"));
    }

    #[test]
    fn test_error_display_includes_field() {
        let err = ValidationError::InvalidField {
            field: "currency".to_string(),
            message: "unsupported".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid field 'currency': unsupported");
    }
}
