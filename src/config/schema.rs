//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use crate::domain::ResourceFormat;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Main client configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// FHIR server connection settings
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration for idempotent requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
    pub fn delay_for_attempt(&self, attempt: usize) -> u64 {
        let factor = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * factor) as u64;
        delay.min(self.max_delay_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("server.retry.max_attempts must be > 0".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("server.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

/// FHIR server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Service base URL of the FHIR server
    pub base_url: String,

    /// Format requested from the server (json or xml)
    #[serde(default)]
    pub preferred_format: ResourceFormat,

    /// Negotiate the format with the `_format` query parameter instead of `Accept`
    #[serde(default)]
    pub use_format_param: bool,

    /// FHIR version announced as a MIME parameter, e.g. "4.0"
    #[serde(default)]
    pub fhir_version: Option<String>,

    /// Send `If-Match` with the resource's version on update and delete
    #[serde(default)]
    pub version_aware_update: bool,

    /// Ask the server to return the full resource after create and update
    #[serde(default = "default_true")]
    pub return_representation: bool,

    /// Authentication type (none, basic, bearer)
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Token for bearer authentication
    #[serde(default)]
    pub token: Option<SecretString>,

    /// TLS certificate verification enabled
    ///
    /// Disabling verification exposes the client to man-in-the-middle
    /// attacks; prefer `tls_ca_cert` for self-signed servers.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Optional PEM file with an additional trusted CA certificate
    #[serde(default)]
    pub tls_ca_cert: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ServerConfig {
    /// Configuration for `base_url` with every other setting at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("server.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("server.base_url must start with http:// or https://".to_string());
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| format!("server.base_url '{}' is not a valid URL: {e}", self.base_url))?;

        let valid_auth_types = ["none", "basic", "bearer"];
        if !valid_auth_types.contains(&self.auth_type.as_str()) {
            return Err(format!(
                "Invalid auth_type '{}'. Must be one of: {}",
                self.auth_type,
                valid_auth_types.join(", ")
            ));
        }

        if self.auth_type == "basic" {
            if self.username.as_ref().map(|s| s.is_empty()).unwrap_or(true) {
                return Err("server.username cannot be empty when auth_type is 'basic'".to_string());
            }
            if self
                .password
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true)
            {
                return Err("server.password cannot be empty when auth_type is 'basic'".to_string());
            }
        }

        if self.auth_type == "bearer"
            && self
                .token
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true)
        {
            return Err("server.token cannot be empty when auth_type is 'bearer'".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("server.timeout_seconds must be > 0".to_string());
        }

        if let Some(version) = &self.fhir_version {
            if version.trim().is_empty() || version.contains([';', ',', ' ']) {
                return Err(format!("server.fhir_version '{version}' is not a valid version"));
            }
        }

        self.retry.validate()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/fhir".to_string(),
            preferred_format: ResourceFormat::Json,
            use_format_param: false,
            fhir_version: None,
            version_aware_update: false,
            return_representation: true,
            auth_type: default_auth_type(),
            username: None,
            password: None,
            token: None,
            tls_verify: true,
            tls_ca_cert: None,
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit console logs as JSON instead of human-readable text
    #[serde(default)]
    pub json_console: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            json_console: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_auth_type() -> String {
    "none".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_connect_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn valid_config() -> ClientConfig {
        ClientConfig {
            application: ApplicationConfig::default(),
            server: ServerConfig::new("https://fhir.example.org/open"),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = valid_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_base_url_scheme_required() {
        let mut config = valid_config();
        config.server.base_url = "fhir.example.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_basic_auth_requires_credentials() {
        let mut config = valid_config();
        config.server.auth_type = "basic".to_string();
        config.server.username = Some("user".to_string());
        assert!(config.validate().unwrap_err().contains("password"));

        config.server.password = Some(secret_string("pass".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bearer_auth_requires_token() {
        let mut config = valid_config();
        config.server.auth_type = "bearer".to_string();
        assert!(config.validate().unwrap_err().contains("token"));
    }

    #[test]
    fn test_unknown_auth_type() {
        let mut config = valid_config();
        config.server.auth_type = "openid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fhir_version_validation() {
        let mut config = valid_config();
        config.server.fhir_version = Some("4.0".to_string());
        assert!(config.validate().is_ok());
        config.server.fhir_version = Some("4.0; x=1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_delay_backoff() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for_attempt(1), 100);
        assert_eq!(retry.delay_for_attempt(2), 200);
        assert_eq!(retry.delay_for_attempt(3), 350);
    }

    #[test]
    fn test_retry_requires_attempt() {
        let mut config = valid_config();
        config.server.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = valid_config();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }
}
