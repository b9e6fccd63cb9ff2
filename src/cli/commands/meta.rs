//! Meta, meta-add and meta-delete command implementations

use super::{connect, parse_identity, print_json, report_failure, EXIT_SUCCESS};
use crate::config::ClientConfig;
use crate::domain::{Coding, Meta, ResourceIdentity};
use clap::Args;

/// Arguments for the meta command
///
/// Without an identity or `--type` the server-wide metadata is fetched.
#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Resource identity (Type/id)
    #[arg(conflicts_with = "resource_type")]
    pub identity: Option<String>,

    /// Metadata used across every resource of this type
    #[arg(long = "type")]
    pub resource_type: Option<String>,
}

impl MetaArgs {
    /// Execute the meta command
    pub async fn execute(&self, config: &ClientConfig) -> anyhow::Result<i32> {
        let identity = match (&self.identity, &self.resource_type) {
            (Some(raw), _) => match parse_identity(raw) {
                Ok(i) => Some(i),
                Err(code) => return Ok(code),
            },
            (None, Some(resource_type)) => match ResourceIdentity::for_type(resource_type) {
                Ok(i) => Some(i),
                Err(e) => return Ok(report_failure("Parsing resource type", &e.into())),
            },
            (None, None) => None,
        };
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let result = match &identity {
            Some(identity) => client.meta(identity).await,
            None => client.whole_system_meta().await,
        };
        match result {
            Ok(meta) => {
                print_json(&meta)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_failure("Fetching meta", &e)),
        }
    }
}

/// Which way a meta change goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaChange {
    Add,
    Delete,
}

/// Arguments for the meta-add and meta-delete commands
#[derive(Args, Debug)]
pub struct MetaChangeArgs {
    /// Resource identity (Type/id); a version part is ignored
    pub identity: String,

    /// Profile URL
    #[arg(long)]
    pub profile: Vec<String>,

    /// Tag as system|code
    #[arg(long, value_parser = parse_coding)]
    pub tag: Vec<Coding>,

    /// Security label as system|code
    #[arg(long, value_parser = parse_coding)]
    pub security: Vec<Coding>,
}

impl MetaChangeArgs {
    /// Labels named on the command line
    pub fn meta(&self) -> Meta {
        let meta = self
            .profile
            .iter()
            .fold(Meta::new(), |meta, profile| meta.with_profile(profile.as_str()));
        let meta = self
            .tag
            .iter()
            .cloned()
            .fold(meta, |meta, tag| meta.with_tag(tag));
        self.security
            .iter()
            .cloned()
            .fold(meta, |meta, label| meta.with_security(label))
    }

    /// Execute the meta-add or meta-delete command
    pub async fn execute(&self, config: &ClientConfig, change: MetaChange) -> anyhow::Result<i32> {
        let identity = match parse_identity(&self.identity) {
            Ok(i) => i,
            Err(code) => return Ok(code),
        };
        let meta = self.meta();
        if meta.is_empty() {
            eprintln!("❌ Nothing to change: give --profile, --tag or --security");
            return Ok(super::EXIT_CONFIGURATION);
        }
        let client = match connect(config) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let (action, result) = match change {
            MetaChange::Add => ("Adding meta", client.affix_meta(&identity, &meta).await),
            MetaChange::Delete => ("Deleting meta", client.delete_meta(&identity, &meta).await),
        };
        match result {
            Ok(updated) => {
                print_json(&updated)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_failure(action, &e)),
        }
    }
}

/// Parses a `system|code` coding
pub fn parse_coding(raw: &str) -> Result<Coding, String> {
    match raw.split_once('|') {
        Some((system, code)) if !system.is_empty() && !code.is_empty() => {
            Ok(Coding::new(system, code))
        }
        _ => Err(format!("'{raw}' must have the form system|code")),
    }
}
