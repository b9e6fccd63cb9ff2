//! Configuration management for the FHIR client.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The client uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FHIR_CLIENT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fhir_rest_client::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fhir-client.toml")?;
//! println!("FHIR server: {}", config.server.base_url);
//! println!("Format: {}", config.server.preferred_format);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ServerConfig`] - Server URL, format negotiation, authentication, timeouts
//! - [`RetryConfig`] - Backoff for idempotent requests
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [server]
//! base_url = "https://fhir.example.org/r4"
//! preferred_format = "json"
//! auth_type = "bearer"
//! token = "${FHIR_CLIENT_TOKEN}"
//!
//! [server.retry]
//! max_attempts = 3
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config, sample_config};
pub use schema::{ApplicationConfig, ClientConfig, LoggingConfig, RetryConfig, ServerConfig};
pub use secret::{
    basic_authorization, bearer_authorization, secret_string, SecretString, SecretValue,
};
