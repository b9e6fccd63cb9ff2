//! Interpretation of server responses

use crate::domain::{FhirError, OperationOutcome, Resource, ResourceFormat, ResourceIdentity};
use reqwest::header::{
    HeaderMap, HeaderName, CONTENT_LOCATION, CONTENT_TYPE, ETAG, LAST_MODIFIED, LOCATION,
};
use serde_json::Value;

/// Longest slice of a non-FHIR error body quoted in an error message
const MAX_ERROR_BODY: usize = 200;

/// Status line and headers of the last response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDetails {
    pub status: u16,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub content_location: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ResponseDetails {
    pub fn from_headers(status: u16, headers: &HeaderMap) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            status,
            content_type: header(CONTENT_TYPE),
            location: header(LOCATION),
            content_location: header(CONTENT_LOCATION),
            etag: header(ETAG),
            last_modified: header(LAST_MODIFIED),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body format named by `Content-Type`
    pub fn format(&self) -> Option<ResourceFormat> {
        self.content_type
            .as_deref()
            .and_then(ResourceFormat::from_content_type)
    }

    /// Version id from the `ETag`, or from the `_history` part of `Location`
    pub fn version_id(&self) -> Option<String> {
        self.etag
            .as_deref()
            .and_then(version_from_etag)
            .or_else(|| {
                self.resource_location()
                    .and_then(|identity| identity.version_id().map(str::to_string))
            })
    }

    /// Identity named by `Location`, falling back to `Content-Location`
    pub fn resource_location(&self) -> Option<ResourceIdentity> {
        self.location
            .as_deref()
            .or(self.content_location.as_deref())
            .and_then(|l| ResourceIdentity::parse(l).ok())
            .filter(|identity| identity.id().is_some())
    }
}

/// Extracts `3` from `W/"3"` or `"3"`
pub fn version_from_etag(etag: &str) -> Option<String> {
    let value = etag.trim();
    let value = value
        .strip_prefix("W/")
        .or_else(|| value.strip_prefix("w/"))
        .unwrap_or(value);
    let value = value.trim_matches('"').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A received response with its body still undecoded
#[derive(Debug, Clone)]
pub struct FhirResponse {
    pub details: ResponseDetails,
    pub body: String,
}

impl FhirResponse {
    pub fn new(details: ResponseDetails, body: String) -> Self {
        Self { details, body }
    }

    /// Turns a non-2xx response into [`FhirError::OperationFailed`]
    ///
    /// The body is decoded as an `OperationOutcome` when it is one; its
    /// issues then become the error message.
    pub fn error_for_status(self) -> Result<Self, FhirError> {
        if self.details.is_success() {
            return Ok(self);
        }

        let outcome = self
            .json_body()
            .ok()
            .flatten()
            .and_then(|value| crate::domain::from_json::<OperationOutcome>(value).ok());

        let message = match &outcome {
            Some(outcome) => outcome.summary(),
            None => {
                let body = self.body.trim();
                if body.is_empty() {
                    reason_phrase(self.details.status).to_string()
                } else {
                    body.chars().take(MAX_ERROR_BODY).collect()
                }
            }
        };

        Err(FhirError::OperationFailed {
            status: self.details.status,
            message,
            outcome,
        })
    }

    /// Body as JSON, `None` when empty
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::UnsupportedFormat`] for XML bodies and
    /// [`FhirError::InvalidResponse`] for malformed JSON.
    pub fn json_body(&self) -> Result<Option<Value>, FhirError> {
        let body = self.body.trim();
        if body.is_empty() {
            return Ok(None);
        }

        let is_xml = match self.details.format() {
            Some(format) => format == ResourceFormat::Xml,
            None => body.starts_with('<'),
        };
        if is_xml {
            return Err(FhirError::UnsupportedFormat(format!(
                "cannot decode {} body",
                self.details
                    .content_type
                    .as_deref()
                    .unwrap_or(ResourceFormat::Xml.content_type())
            )));
        }

        serde_json::from_str(body)
            .map(Some)
            .map_err(|e| FhirError::InvalidResponse(format!("body is not valid JSON: {e}")))
    }

    /// Decodes the body as `R`, `None` when the body is empty
    ///
    /// A resource without `meta.versionId` is given the version the
    /// response headers report.
    pub fn resource<R: Resource>(&self) -> Result<Option<R>, FhirError> {
        let Some(value) = self.json_body()? else {
            return Ok(None);
        };
        let mut resource = R::from_resource_json(value)?;
        if resource.version_id().is_none() {
            if let Some(vid) = self.details.version_id() {
                resource.meta_mut().version_id = Some(vid);
            }
        }
        if resource.meta().is_some_and(|m| m.last_updated.is_none()) {
            if let Some(modified) = &self.details.last_modified {
                resource.meta_mut().last_updated = Some(modified.clone());
            }
        }
        Ok(Some(resource))
    }

    /// Decodes the body as `R`, failing when it is empty
    pub fn require_resource<R: Resource>(&self) -> Result<R, FhirError> {
        self.resource()?.ok_or_else(|| {
            FhirError::InvalidResponse(format!(
                "status {} response has no body",
                self.details.status
            ))
        })
    }
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Patient;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> FhirResponse {
        FhirResponse::new(
            ResponseDetails {
                status,
                content_type: content_type.map(str::to_string),
                ..Default::default()
            },
            body.to_string(),
        )
    }

    #[test_case("W/\"3\"", Some("3") ; "weak")]
    #[test_case("\"12\"", Some("12") ; "strong")]
    #[test_case("W/\"\"", None ; "empty")]
    fn test_version_from_etag(etag: &str, expected: Option<&str>) {
        assert_eq!(version_from_etag(etag).as_deref(), expected);
    }

    #[test]
    fn test_details_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/fhir+json;charset=utf-8"));
        headers.insert(
            LOCATION,
            HeaderValue::from_static("http://localhost/fhir/Patient/9/_history/2"),
        );

        let details = ResponseDetails::from_headers(201, &headers);
        assert!(details.is_success());
        assert_eq!(details.format(), Some(ResourceFormat::Json));
        assert_eq!(details.version_id().as_deref(), Some("2"));
        assert_eq!(details.resource_location().unwrap().id(), Some("9"));
        assert_eq!(details.etag, None);
    }

    #[test]
    fn test_empty_body_is_none() {
        let response = response(204, None, "  ");
        assert!(response.resource::<Patient>().unwrap().is_none());
        assert!(response.require_resource::<Patient>().is_err());
    }

    #[test]
    fn test_xml_body_unsupported() {
        let response = response(200, Some("application/fhir+xml"), "<Patient/>");
        assert!(matches!(
            response.json_body(),
            Err(FhirError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_resource_takes_version_from_etag() {
        let mut response = response(
            200,
            Some("application/fhir+json"),
            r#"{"resourceType":"Patient","id":"1"}"#,
        );
        response.details.etag = Some("W/\"5\"".to_string());

        let patient: Patient = response.require_resource().unwrap();
        assert_eq!(patient.version_id(), Some("5"));
    }

    #[test]
    fn test_error_with_operation_outcome() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "not-found", "diagnostics": "Patient/x is unknown"}]
        }"#;
        let err = response(404, Some("application/fhir+json"), body)
            .error_for_status()
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.outcome().is_some());
        assert!(err.to_string().contains("Patient/x is unknown"));
    }

    #[test]
    fn test_error_without_body_uses_reason() {
        let err = response(410, None, "").error_for_status().unwrap_err();
        assert_eq!(err.status(), Some(410));
        assert!(err.to_string().contains("Gone"));
        assert!(err.outcome().is_none());
    }
}
