//! History command implementation

use super::{connect, parse_identity, print_json, report_failure, EXIT_SUCCESS};
use crate::config::ClientConfig;
use crate::domain::{Bundle, ResourceIdentity};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;

/// Arguments for the history command
///
/// Without an identity or `--type` the whole server history is fetched.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Resource identity (Type/id) whose versions to list
    #[arg(conflicts_with = "resource_type")]
    pub identity: Option<String>,

    /// List the history of every resource of this type
    #[arg(long = "type")]
    pub resource_type: Option<String>,

    /// Only changes after this instant (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Page size requested from the server
    #[arg(long)]
    pub count: Option<u32>,
}

impl HistoryArgs {
    /// Execute the history command
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
            Some(identity) => client.history(identity, self.since, self.count).await,
            None => client.whole_system_history(self.since, self.count).await,
        };

        match result {
            Ok(bundle) => {
                log_history(&bundle);
                print_json(&bundle)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_failure("History", &e)),
        }
    }
}

fn log_history(bundle: &Bundle) {
    tracing::info!(
        entries = bundle.entry.len(),
        deleted = bundle.deleted_count(),
        total = bundle.total,
        "History fetched"
    );
}

/// Parses an RFC 3339 instant or a plain date (midnight UTC)
pub fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{raw}' is not an RFC 3339 instant or YYYY-MM-DD date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_since() {
        assert_eq!(
            parse_since("2024-03-01T10:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_since("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_since("yesterday").is_err());
    }
}
