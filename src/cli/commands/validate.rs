//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the client configuration file.

use super::{EXIT_CONFIGURATION, EXIT_SUCCESS};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                eprintln!("❌ Configuration is not valid");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        let server = &config.server;
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  FHIR Server: {}", server.base_url);
        println!("  Preferred Format: {}", server.preferred_format);
        println!(
            "  Format Negotiation: {}",
            if server.use_format_param {
                "_format parameter"
            } else {
                "Accept header"
            }
        );
        println!(
            "  FHIR Version: {}",
            server.fhir_version.as_deref().unwrap_or("(not announced)")
        );
        println!("  Version-Aware Updates: {}", server.version_aware_update);
        println!("  Authentication: {}", server.auth_type);
        if let Some(username) = &server.username {
            println!("  Username: {username}");
        }
        println!("  TLS Verify: {}", server.tls_verify);
        println!("  Timeout: {}s", server.timeout_seconds);
        println!("  Retry Attempts: {}", server.retry.max_attempts);
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_missing_file() {
        let args = ValidateArgs {};
        let code = args.execute("/nonexistent/fhir-client.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIGURATION);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nbase_url = \"http://localhost:8080/fhir\"\n")
            .unwrap();

        let args = ValidateArgs {};
        let code = args
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }
}
