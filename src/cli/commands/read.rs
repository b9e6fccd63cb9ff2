//! Read command implementation

use super::{connect, parse_identity, print_json, report_failure, EXIT_SUCCESS};
use crate::config::ClientConfig;
use clap::Args;

/// Arguments for the read command
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Resource identity: Type/id, Type/id/_history/vid or an absolute URL
    pub identity: String,
}

impl ReadArgs {
    /// Execute the read command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let identity = match parse_identity(&self.identity) {
            Ok(i) => i,
            Err(code) => return Ok(code),
        };
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.read_dynamic(&identity).await {
            Ok(resource) => {
                print_json(&resource)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) if e.is_gone() => {
                println!("🗑️  {identity} has been deleted");
                Ok(report_failure("Read", &e))
            }
            Err(e) => Ok(report_failure("Read", &e)),
        }
    }
}
