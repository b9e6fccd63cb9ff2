//! CLI command implementations
//!
//! Every command returns the process exit code:
//! 0 success, 2 configuration or input error, 3 server reported failure,
//! 4 connection error, 5 fatal error.

pub mod capabilities;
pub mod history;
pub mod init;
pub mod meta;
pub mod read;
pub mod search;
pub mod validate;
pub mod write;

use crate::adapters::fhir::FhirClient;
use crate::config::ClientConfig;
use crate::domain::{ClientError, FhirError, ResourceIdentity};
use serde::Serialize;
use std::io::{self, Write};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIGURATION: i32 = 2;
pub const EXIT_SERVER: i32 = 3;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error returned by the client
pub fn exit_code_for(error: &ClientError) -> i32 {
    match error {
        ClientError::Configuration(_)
        | ClientError::Validation(_)
        | ClientError::Authentication(_) => EXIT_CONFIGURATION,
        ClientError::Connection(_) => EXIT_CONNECTION,
        ClientError::Fhir(e) => match e {
            FhirError::ConnectionFailed(_) | FhirError::Timeout(_) => EXIT_CONNECTION,
            FhirError::OperationFailed { .. }
            | FhirError::InvalidResponse(_)
            | FhirError::UnsupportedFormat(_) => EXIT_SERVER,
            FhirError::InvalidIdentity(_) | FhirError::InvalidSearch(_) => EXIT_CONFIGURATION,
        },
        ClientError::Serialization(_) | ClientError::Io(_) | ClientError::Other(_) => EXIT_FATAL,
    }
}

/// Prints a failed operation to stderr and returns its exit code
///
/// Stdout stays reserved for resource JSON so output can be piped.
pub(crate) fn report_failure(action: &str, error: &ClientError) -> i32 {
    tracing::error!(action, error = %error, "Command failed");
    // Nothing useful can be done if stderr itself is gone
    let _ = write_failure(&mut std::io::stderr().lock(), action, error);
    exit_code_for(error)
}

fn write_failure<W: Write>(out: &mut W, action: &str, error: &ClientError) -> io::Result<()> {
    writeln!(out, "❌ {action} failed")?;
    writeln!(out, "   Error: {error}")?;
    if let Some(outcome) = error.outcome() {
        for issue in &outcome.issue {
            writeln!(
                out,
                "   {} ({}): {}",
                issue.severity,
                issue.code,
                issue.diagnostics.as_deref().unwrap_or("-")
            )?;
        }
    }
    Ok(())
}

/// Builds a client, printing the failure if configuration is unusable
pub(crate) fn connect(config: &ClientConfig) -> Result<FhirClient, i32> {
    FhirClient::new(config.server.clone()).map_err(|e| report_failure("Client setup", &e))
}

/// Parses an identity argument, printing the failure if malformed
pub(crate) fn parse_identity(raw: &str) -> Result<ResourceIdentity, i32> {
    ResourceIdentity::parse(raw).map_err(|e| report_failure("Parsing identity", &e.into()))
}

/// Writes `value` to stdout as pretty-printed JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Issue, OperationOutcome};
    use test_case::test_case;

    #[test_case(ClientError::Configuration("x".into()), EXIT_CONFIGURATION ; "configuration")]
    #[test_case(ClientError::Fhir(FhirError::Timeout("x".into())), EXIT_CONNECTION ; "timeout")]
    #[test_case(ClientError::Fhir(FhirError::InvalidSearch("x".into())), EXIT_CONFIGURATION ; "bad criteria")]
    #[test_case(
        ClientError::Fhir(FhirError::OperationFailed { status: 404, message: "x".into(), outcome: None }),
        EXIT_SERVER ;
        "not found"
    )]
    #[test_case(ClientError::Io("x".into()), EXIT_FATAL ; "io")]
    fn test_exit_code_for(error: ClientError, expected: i32) {
        assert_eq!(exit_code_for(&error), expected);
    }

    #[test]
    fn test_write_failure_lists_outcome_issues() {
        let outcome = OperationOutcome {
            issue: vec![Issue::error("not-found", "Patient/1 is not known")],
            ..Default::default()
        };
        let error = ClientError::Fhir(FhirError::OperationFailed {
            status: 404,
            message: "Not Found".into(),
            outcome: Some(outcome),
        });

        let mut out = Vec::new();
        write_failure(&mut out, "Read", &error).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("❌ Read failed\n"));
        assert!(text.contains("   error (not-found): Patient/1 is not known"));
        assert_eq!(report_failure("Read", &error), EXIT_SERVER);
    }
}
