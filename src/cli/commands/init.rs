//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIGURATION, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::sample_config;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "fhir-client.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing FHIR client configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            eprintln!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIGURATION);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set server.base_url in {}", self.output);
                println!("  2. For authenticated servers, put credentials in a .env file:");
                println!("     - FHIR_CLIENT_SERVER_USERNAME / FHIR_CLIENT_SERVER_PASSWORD");
                println!("     - or FHIR_CLIENT_SERVER_TOKEN");
                println!("  3. Validate configuration: fhir-client validate-config");
                println!("  4. Check the server: fhir-client capabilities");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("❌ Failed to write configuration file");
                eprintln!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }
}
