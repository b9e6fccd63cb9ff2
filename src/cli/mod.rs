//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the FHIR client using clap.

pub mod commands;

use crate::config::{load_config, ApplicationConfig, ClientConfig, LoggingConfig, ServerConfig};
use crate::domain::{ClientError, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

/// fhir-client - Command-line client for FHIR REST servers
#[derive(Parser, Debug)]
#[command(name = "fhir-client")]
#[command(version, about, long_about = None)]
#[command(author = "FHIR REST Client Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fhir-client.toml", env = "FHIR_CLIENT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FHIR_CLIENT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// FHIR server base URL; overrides the configuration file
    #[arg(short, long, env = "FHIR_CLIENT_BASE_URL")]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the server's capability statement
    Capabilities(commands::capabilities::CapabilitiesArgs),

    /// Read a resource, or a specific version with Type/id/_history/vid
    Read(commands::read::ReadArgs),

    /// Search resources of a type
    Search(commands::search::SearchArgs),

    /// List the version history of a resource, a type or the whole server
    History(commands::history::HistoryArgs),

    /// Create a resource from a JSON file
    Create(commands::write::CreateArgs),

    /// Update a resource from a JSON file
    Update(commands::write::UpdateArgs),

    /// Delete a resource
    Delete(commands::write::DeleteArgs),

    /// Show profiles, tags and security labels in use
    Meta(commands::meta::MetaArgs),

    /// Add profiles, tags or security labels to a resource
    MetaAdd(commands::meta::MetaChangeArgs),

    /// Remove profiles, tags or security labels from a resource
    MetaDelete(commands::meta::MetaChangeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Resolves the client configuration for this invocation
    ///
    /// The configuration file is used when it exists. Without one, `--base-url`
    /// alone is enough to talk to a server with default settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when neither source is available or the
    /// result does not validate.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = if Path::new(&self.config).exists() {
            load_config(&self.config)?
        } else if let Some(base_url) = &self.base_url {
            ClientConfig {
                application: ApplicationConfig::default(),
                server: ServerConfig::new(base_url.as_str()),
                logging: LoggingConfig::default(),
            }
        } else {
            return Err(ClientError::Configuration(format!(
                "Configuration file not found: {}. Run `fhir-client init` or pass --base-url",
                self.config
            )));
        };

        if let Some(base_url) = &self.base_url {
            tracing::debug!(base_url = %base_url, "Overriding server base URL");
            config.server.base_url = base_url.clone();
        }
        config.validate().map_err(ClientError::Configuration)?;
        Ok(config)
    }
}
