//! Domain error types
//!
//! This module defines the error hierarchy for the client.
//! All errors are domain-specific and don't expose third-party types.

use super::outcome::OperationOutcome;
use thiserror::Error;

/// Main client error type
///
/// This is the primary error type used throughout the library.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// FHIR protocol errors
    #[error("FHIR error: {0}")]
    Fhir(#[from] FhirError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// HTTP status reported by the server, if this error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Fhir(e) => e.status(),
            _ => None,
        }
    }

    /// Operation outcome returned by the server, if any
    pub fn outcome(&self) -> Option<&OperationOutcome> {
        match self {
            ClientError::Fhir(e) => e.outcome(),
            _ => None,
        }
    }

    /// True when the server answered 404 Not Found
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True when the server answered 410 Gone
    pub fn is_gone(&self) -> bool {
        self.status() == Some(410)
    }
}

/// FHIR-specific errors
///
/// Errors that occur when exchanging requests with a FHIR server.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum FhirError {
    /// Failed to connect to the FHIR server
    #[error("Failed to connect to FHIR server: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("Operation failed with status {status}: {message}")]
    OperationFailed {
        status: u16,
        message: String,
        outcome: Option<OperationOutcome>,
    },

    /// Response body could not be interpreted
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Response used a wire format this client cannot decode
    #[error("Unsupported resource format: {0}")]
    UnsupportedFormat(String),

    /// Malformed resource identity
    #[error("Invalid resource identity: {0}")]
    InvalidIdentity(String),

    /// Invalid search criterion
    #[error("Invalid search parameter: {0}")]
    InvalidSearch(String),
}

impl FhirError {
    /// HTTP status carried by an [`FhirError::OperationFailed`]
    pub fn status(&self) -> Option<u16> {
        match self {
            FhirError::OperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Operation outcome carried by an [`FhirError::OperationFailed`]
    pub fn outcome(&self) -> Option<&OperationOutcome> {
        match self {
            FhirError::OperationFailed { outcome, .. } => outcome.as_ref(),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::{Issue, OperationOutcome};

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_fhir_error_conversion() {
        let fhir_err = FhirError::ConnectionFailed("Network error".to_string());
        let err: ClientError = fhir_err.into();
        assert!(matches!(err, ClientError::Fhir(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_status_helpers() {
        let err: ClientError = FhirError::OperationFailed {
            status: 404,
            message: "Location/45qq54".to_string(),
            outcome: None,
        }
        .into();
        assert!(err.is_not_found());
        assert!(!err.is_gone());

        let err: ClientError = FhirError::OperationFailed {
            status: 410,
            message: "deleted".to_string(),
            outcome: None,
        }
        .into();
        assert!(err.is_gone());
    }

    #[test]
    fn test_outcome_is_exposed() {
        let outcome = OperationOutcome {
            issue: vec![Issue::error("not-found", "Resource Patient/1 is not known")],
            ..Default::default()
        };
        let err: ClientError = FhirError::OperationFailed {
            status: 404,
            message: outcome.summary(),
            outcome: Some(outcome),
        }
        .into();
        assert_eq!(err.outcome().map(|o| o.issue.len()), Some(1));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ClientError = io_err.into();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ClientError = toml_err.into();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_client_error_implements_std_error() {
        let err = ClientError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
