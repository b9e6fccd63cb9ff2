//! Create, update and delete command implementations

use super::{
    connect, parse_identity, print_json, report_failure, EXIT_CONFIGURATION, EXIT_SUCCESS,
};
use crate::config::ClientConfig;
use crate::domain::{DynamicResource, Resource};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON file holding the resource to create
    pub file: PathBuf,
}

impl CreateArgs {
    /// Execute the create command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let resource = match load_resource(&self.file) {
            Ok(r) => r,
            Err(code) => return Ok(code),
        };
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.create(&resource).await {
            Ok(created) => {
                println!(
                    "✅ Created {}/{} (version {})",
                    created.resource_type(),
                    created.id().unwrap_or("?"),
                    created.version_id().unwrap_or("?")
                );
                print_json(&created)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_failure("Create", &e)),
        }
    }
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// JSON file holding the resource to update; it must carry an id
    pub file: PathBuf,

    /// Send If-Match with the resource's meta.versionId
    #[arg(long)]
    pub version_aware: bool,
}

impl UpdateArgs {
    /// Execute the update command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let resource = match load_resource(&self.file) {
            Ok(r) => r,
            Err(code) => return Ok(code),
        };
        let mut client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if self.version_aware {
            client.set_version_aware_update(true);
        }

        match client.update(&resource).await {
            Ok(updated) => {
                println!(
                    "✅ Updated {}/{} (version {})",
                    updated.resource_type(),
                    updated.id().unwrap_or("?"),
                    updated.version_id().unwrap_or("?")
                );
                print_json(&updated)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) if e.status() == Some(412) => {
                println!(
                    "⚠️  The resource was changed on the server since version {}",
                    resource.version_id().unwrap_or("?")
                );
                Ok(report_failure("Update", &e))
            }
            Err(e) => Ok(report_failure("Update", &e)),
        }
    }
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Resource identity (Type/id)
    pub identity: String,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let identity = match parse_identity(&self.identity) {
            Ok(i) => i,
            Err(code) => return Ok(code),
        };
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.delete(&identity).await {
            Ok(outcome) => {
                println!("✅ Deleted {}", identity.without_version());
                if let Some(outcome) = outcome {
                    println!("   {}", outcome.summary());
                }
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_failure("Delete", &e)),
        }
    }
}

/// Reads a resource from a JSON file, printing the failure
fn load_resource(path: &Path) -> Result<DynamicResource, i32> {
    let contents = fs::read_to_string(path).map_err(|e| {
        eprintln!("❌ Failed to read {}", path.display());
        eprintln!("   Error: {e}");
        EXIT_CONFIGURATION
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        eprintln!("❌ {} does not hold a FHIR resource", path.display());
        eprintln!("   Error: {e}");
        EXIT_CONFIGURATION
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_resource() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"resourceType": "Patient", "id": "1", "active": true}"#)
            .unwrap();

        let resource = load_resource(file.path()).unwrap();
        assert_eq!(resource.resource_type(), "Patient");
        assert_eq!(resource.id(), Some("1"));
    }

    #[test]
    fn test_load_resource_rejects_non_resource() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"id": "1"}"#).unwrap();
        assert_eq!(load_resource(file.path()).unwrap_err(), EXIT_CONFIGURATION);
        assert_eq!(
            load_resource(Path::new("/nonexistent/patient.json")).unwrap_err(),
            EXIT_CONFIGURATION
        );
    }
}
