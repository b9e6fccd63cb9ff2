//! Capabilities command implementation
//!
//! Fetches the server's capability statement and prints a summary.

use super::{connect, print_json, report_failure, EXIT_SUCCESS};
use crate::config::ClientConfig;
use crate::domain::CapabilityStatement;
use clap::Args;

/// Arguments for the capabilities command
#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
    /// Print the full capability statement as JSON
    #[arg(long)]
    pub json: bool,
}

impl CapabilitiesArgs {
    /// Execute the capabilities command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let statement = match client.capabilities().await {
            Ok(s) => s,
            Err(e) => return Ok(report_failure("Fetching capabilities", &e)),
        };

        if self.json {
            print_json(&statement)?;
        } else {
            print_summary(client.endpoint().as_str(), &statement);
        }
        Ok(EXIT_SUCCESS)
    }
}

fn print_summary(endpoint: &str, statement: &CapabilityStatement) {
    println!("🏥 FHIR server: {endpoint}");
    println!();
    println!(
        "  FHIR Version: {}",
        statement.fhir_version.as_deref().unwrap_or("unknown")
    );
    if let Some(software) = &statement.software {
        println!(
            "  Software: {} {}",
            software.name.as_deref().unwrap_or("unknown"),
            software.version.as_deref().unwrap_or("")
        );
    }
    if !statement.format.is_empty() {
        println!("  Formats: {}", statement.format.join(", "));
    }
    match statement.server_rest() {
        Some(rest) => {
            let types: Vec<&str> = rest
                .resource
                .iter()
                .map(|r| r.resource_type.as_str())
                .collect();
            println!("  Resource Types ({}): {}", types.len(), types.join(", "));
        }
        None => println!("  No server REST capabilities declared"),
    }
    println!();
}
