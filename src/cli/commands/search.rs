//! Search command implementation
//!
//! Runs a type-level search and prints the matching resources, following
//! `next` links for up to `--pages` pages.

use super::{connect, print_json, report_failure, EXIT_SUCCESS};
use crate::adapters::fhir::SearchParams;
use crate::config::ClientConfig;
use crate::domain::{DynamicResource, FhirError, PageDirection, ResourceIdentity};
use clap::Args;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Resource type to search, e.g. Patient
    pub resource_type: String,

    /// Search criteria as name=value
    pub criteria: Vec<String>,

    /// Include referenced resources, e.g. DiagnosticReport:subject
    #[arg(long)]
    pub include: Vec<String>,

    /// Page size requested from the server
    #[arg(long)]
    pub count: Option<u32>,

    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

impl SearchArgs {
    fn params(&self) -> Result<SearchParams, FhirError> {
        ResourceIdentity::for_type(&self.resource_type)?;
        let mut params = SearchParams::from_criteria(&self.criteria)?;
        for path in &self.include {
            params = params.include(path.as_str());
        }
        if let Some(count) = self.count {
            params = params.count(count);
        }
        Ok(params)
    }

    /// Execute the search command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let params = match self.params() {
            Ok(p) => p,
            Err(e) => return Ok(report_failure("Parsing search arguments", &e.into())),
        };
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let mut bundle = match client.search_type(&self.resource_type, &params).await {
            Ok(b) => b,
            Err(e) => return Ok(report_failure("Search", &e)),
        };
        let total = bundle.total;
        let mut resources: Vec<DynamicResource> = bundle.resources().cloned().collect();
        let mut pages = 1;

        while pages < self.pages.max(1) {
            match client.continue_bundle(&bundle, PageDirection::Next).await {
                Ok(Some(next)) => {
                    resources.extend(next.resources().cloned());
                    bundle = next;
                    pages += 1;
                }
                Ok(None) => break,
                Err(e) => return Ok(report_failure("Fetching next page", &e)),
            }
        }

        tracing::info!(
            resource_type = %self.resource_type,
            returned = resources.len(),
            total = total,
            pages,
            "Search finished"
        );
        print_json(&resources)?;
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{exit_code_for, EXIT_CONFIGURATION};

    #[test]
    fn test_params_from_args() {
        let args = SearchArgs {
            resource_type: "DiagnosticReport".to_string(),
            criteria: vec!["_id=rep1".to_string()],
            include: vec!["DiagnosticReport:subject".to_string()],
            count: Some(5),
            pages: 1,
        };
        let pairs = args.params().unwrap().to_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], ("_id".to_string(), "rep1".to_string()));
        assert_eq!(pairs[2], ("_count".to_string(), "5".to_string()));
    }

    #[test]
    fn test_invalid_resource_type_is_input_error() {
        let args = SearchArgs {
            resource_type: "patient?name=x".to_string(),
            criteria: vec![],
            include: vec![],
            count: None,
            pages: 1,
        };
        let err = args.params().unwrap_err();
        assert!(matches!(err, FhirError::InvalidIdentity(_)));
        assert_eq!(exit_code_for(&err.into()), EXIT_CONFIGURATION);
    }
}
