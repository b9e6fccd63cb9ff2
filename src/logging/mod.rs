//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable or JSON console output
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use fhir_rest_client::logging::init_logging;
//! use fhir_rest_client::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log an outgoing HTTP request
///
/// # Example
///
/// ```no_run
/// use fhir_rest_client::log_request;
///
/// log_request!("GET", "http://localhost:8080/fhir/Patient/1");
/// ```
#[macro_export]
macro_rules! log_request {
    ($method:expr, $url:expr) => {
        tracing::debug!(
            method = %$method,
            url = %$url,
            "Sending request"
        );
    };
}

/// Log the status line of a received HTTP response
///
/// # Example
///
/// ```no_run
/// use fhir_rest_client::log_response;
/// use std::time::Duration;
///
/// log_response!("GET", "http://localhost:8080/fhir/Patient/1", 200, Duration::from_millis(12));
/// ```
#[macro_export]
macro_rules! log_response {
    ($method:expr, $url:expr, $status:expr, $elapsed:expr) => {
        tracing::debug!(
            method = %$method,
            url = %$url,
            status = $status,
            elapsed_ms = $elapsed.as_millis() as u64,
            "Received response"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use fhir_rest_client::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection refused");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying request"
        );
    };
}
