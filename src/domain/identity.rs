//! Resource identity parsing and building
//!
//! A resource identity names a resource type, optionally a logical id and a
//! version, and optionally the base URL of the server that holds it:
//!
//! ```text
//! [base/]Type[/id[/_history/vid]]
//! ```

use super::errors::FhirError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

const HISTORY_SEGMENT: &str = "_history";
const MAX_ID_LENGTH: usize = 64;

/// Resource types recognised when a base path segment could also be read as
/// a type name, as in `http://server/FHIR/Patient`
const KNOWN_RESOURCE_TYPES: &[&str] = &[
    "Account", "AllergyIntolerance", "Appointment", "AuditEvent", "Basic", "Binary",
    "Bundle", "CapabilityStatement", "CarePlan", "CareTeam", "Claim", "CodeSystem",
    "Communication", "Composition", "ConceptMap", "Condition", "Consent", "Coverage",
    "Device", "DiagnosticReport", "DocumentReference", "Encounter", "Endpoint",
    "EpisodeOfCare", "Flag", "Goal", "Group", "HealthcareService", "ImagingStudy",
    "Immunization", "Library", "List", "Location", "Measure", "Media", "Medication",
    "MedicationAdministration", "MedicationDispense", "MedicationRequest",
    "MedicationStatement", "MessageHeader", "NamingSystem", "Observation",
    "OperationDefinition", "OperationOutcome", "Organization", "Parameters", "Patient",
    "Person", "Practitioner", "PractitionerRole", "Procedure", "Provenance",
    "Questionnaire", "QuestionnaireResponse", "RelatedPerson", "ServiceRequest",
    "Slot", "Specimen", "StructureDefinition", "Subscription", "Substance", "Task",
    "ValueSet",
];

/// Identity of a resource, a resource version or a resource type collection
///
/// # Examples
///
/// ```
/// use fhir_rest_client::domain::ResourceIdentity;
///
/// let identity = ResourceIdentity::parse("http://example.org/fhir/Patient/1/_history/2").unwrap();
/// assert_eq!(identity.resource_type(), "Patient");
/// assert_eq!(identity.id(), Some("1"));
/// assert_eq!(identity.version_id(), Some("2"));
/// assert_eq!(identity.without_version().to_string(), "http://example.org/fhir/Patient/1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    base: Option<Url>,
    resource_type: String,
    id: Option<String>,
    version_id: Option<String>,
}

impl ResourceIdentity {
    /// Parses a relative or absolute identity
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidIdentity`] if the input does not have the form
    /// `[base/]Type[/id[/_history/vid]]`.
    pub fn parse(input: &str) -> Result<Self, FhirError> {
        let trimmed = input.trim();
        let without_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        if without_query.is_empty() {
            return Err(FhirError::InvalidIdentity(
                "resource identity cannot be empty".to_string(),
            ));
        }

        let (origin, path) = if is_absolute_url(without_query) {
            let url = Url::parse(without_query).map_err(|e| {
                FhirError::InvalidIdentity(format!("'{without_query}' is not a valid URL: {e}"))
            })?;
            let path = url.path().to_string();
            let mut origin = url;
            origin.set_path("");
            (Some(origin), path)
        } else {
            (None, without_query.to_string())
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (type_index, id, version_id) = locate_identity(&segments, input)?;

        if origin.is_none() && type_index != 0 {
            return Err(FhirError::InvalidIdentity(format!(
                "unexpected segments before resource type in '{input}'"
            )));
        }

        let base = match origin {
            Some(mut base) => {
                let prefix = segments[..type_index].join("/");
                base.set_path(&format!("/{prefix}"));
                Some(base)
            }
            None => None,
        };

        Ok(Self {
            base,
            resource_type: segments[type_index].to_string(),
            id,
            version_id,
        })
    }

    /// Builds a relative identity `Type/id`
    pub fn build(resource_type: &str, id: &str) -> Result<Self, FhirError> {
        validate_type(resource_type)?;
        validate_id(id, "id")?;
        Ok(Self {
            base: None,
            resource_type: resource_type.to_string(),
            id: Some(id.to_string()),
            version_id: None,
        })
    }

    /// Builds a relative versioned identity `Type/id/_history/vid`
    pub fn build_versioned(
        resource_type: &str,
        id: &str,
        version_id: &str,
    ) -> Result<Self, FhirError> {
        Self::build(resource_type, id)?.with_version(version_id)
    }

    /// Builds an absolute identity `base/Type/id`
    pub fn build_with_base(base: &str, resource_type: &str, id: &str) -> Result<Self, FhirError> {
        Self::build(resource_type, id)?.with_base(base)
    }

    /// Builds an identity for a whole resource type collection
    pub fn for_type(resource_type: &str) -> Result<Self, FhirError> {
        validate_type(resource_type)?;
        Ok(Self {
            base: None,
            resource_type: resource_type.to_string(),
            id: None,
            version_id: None,
        })
    }

    /// Resource type name
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Logical id, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Version id, if any
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Server base, if the identity is absolute
    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn is_absolute(&self) -> bool {
        self.base.is_some()
    }

    pub fn is_relative(&self) -> bool {
        self.base.is_none()
    }

    pub fn has_version(&self) -> bool {
        self.version_id.is_some()
    }

    /// Same identity without the version part
    pub fn without_version(&self) -> Self {
        Self {
            version_id: None,
            ..self.clone()
        }
    }

    /// Same identity pinned to the given version
    pub fn with_version(&self, version_id: &str) -> Result<Self, FhirError> {
        if self.id.is_none() {
            return Err(FhirError::InvalidIdentity(format!(
                "cannot add a version to type-level identity '{self}'"
            )));
        }
        validate_id(version_id, "version id")?;
        Ok(Self {
            version_id: Some(version_id.to_string()),
            ..self.clone()
        })
    }

    /// Same identity anchored at a different server base
    pub fn with_base(&self, base: &str) -> Result<Self, FhirError> {
        let trimmed = base.trim().trim_end_matches('/');
        if !is_absolute_url(trimmed) {
            return Err(FhirError::InvalidIdentity(format!(
                "base '{base}' must be an absolute http(s) URL"
            )));
        }
        let url = Url::parse(trimmed).map_err(|e| {
            FhirError::InvalidIdentity(format!("base '{base}' is not a valid URL: {e}"))
        })?;
        Ok(Self {
            base: Some(url),
            ..self.clone()
        })
    }

    /// Same identity without the server base
    pub fn make_relative(&self) -> Self {
        Self {
            base: None,
            ..self.clone()
        }
    }

    /// Relative path `Type[/id[/_history/vid]]`
    pub fn relative_path(&self) -> String {
        let mut path = self.resource_type.clone();
        if let Some(id) = &self.id {
            path.push('/');
            path.push_str(id);
            if let Some(vid) = &self.version_id {
                path.push('/');
                path.push_str(HISTORY_SEGMENT);
                path.push('/');
                path.push_str(vid);
            }
        }
        path
    }

    /// Resolves the identity to a request URL
    ///
    /// Absolute identities resolve to themselves; relative ones are appended
    /// to the endpoint path.
    pub fn to_url(&self, endpoint: &Url) -> Result<Url, FhirError> {
        let base = self.base.as_ref().unwrap_or(endpoint);
        join_path(base, &self.relative_path())
    }
}

/// Appends a relative path to a base URL, keeping the base path intact
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, FhirError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(url)
}

fn is_absolute_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Finds the resource-type segment and returns `(type_index, id, version_id)`
fn locate_identity(
    segments: &[&str],
    input: &str,
) -> Result<(usize, Option<String>, Option<String>), FhirError> {
    let n = segments.len();
    if n == 0 {
        return Err(FhirError::InvalidIdentity(format!(
            "no resource type in '{input}'"
        )));
    }

    if let Some(h) = segments.iter().rposition(|s| *s == HISTORY_SEGMENT) {
        if h + 2 != n {
            return Err(FhirError::InvalidIdentity(format!(
                "'{HISTORY_SEGMENT}' must be followed by exactly one version id in '{input}'"
            )));
        }
        if h < 2 {
            return Err(FhirError::InvalidIdentity(format!(
                "versioned identity needs a type and an id in '{input}'"
            )));
        }
        validate_type(segments[h - 2])?;
        validate_id(segments[h - 1], "id")?;
        validate_id(segments[h + 1], "version id")?;
        return Ok((
            h - 2,
            Some(segments[h - 1].to_string()),
            Some(segments[h + 1].to_string()),
        ));
    }

    if n >= 2 && is_type_name(segments[n - 2]) && !ends_with_type(segments) {
        validate_id(segments[n - 1], "id")?;
        return Ok((n - 2, Some(segments[n - 1].to_string()), None));
    }

    validate_type(segments[n - 1])?;
    Ok((n - 1, None, None))
}

/// `[.., Base, Type]` where the last segment is a known type and the one
/// before it is not, so it belongs to the base path
fn ends_with_type(segments: &[&str]) -> bool {
    let n = segments.len();
    n >= 2
        && KNOWN_RESOURCE_TYPES.contains(&segments[n - 1])
        && !KNOWN_RESOURCE_TYPES.contains(&segments[n - 2])
}

fn is_type_name(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn validate_type(value: &str) -> Result<(), FhirError> {
    if is_type_name(value) {
        Ok(())
    } else {
        Err(FhirError::InvalidIdentity(format!(
            "'{value}' is not a valid resource type"
        )))
    }
}

fn validate_id(value: &str, what: &str) -> Result<(), FhirError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_ID_LENGTH
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(FhirError::InvalidIdentity(format!(
            "'{value}' is not a valid {what}"
        )))
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{}/", base.as_str().trim_end_matches('/'))?;
        }
        write!(f, "{}", self.relative_path())
    }
}

impl FromStr for ResourceIdentity {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceIdentity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ResourceIdentity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Location/1", "Location", Some("1"), None ; "relative")]
    #[test_case("Location/1/_history/3", "Location", Some("1"), Some("3") ; "relative versioned")]
    #[test_case("Patient", "Patient", None, None ; "type only")]
    #[test_case("Patient/abc-1.2/", "Patient", Some("abc-1.2"), None ; "trailing slash")]
    #[test_case("Patient/1?_format=json", "Patient", Some("1"), None ; "query ignored")]
    fn test_parse_relative(input: &str, ty: &str, id: Option<&str>, vid: Option<&str>) {
        let identity = ResourceIdentity::parse(input).unwrap();
        assert!(identity.is_relative());
        assert_eq!(identity.resource_type(), ty);
        assert_eq!(identity.id(), id);
        assert_eq!(identity.version_id(), vid);
    }

    #[test]
    fn test_parse_absolute() {
        let identity =
            ResourceIdentity::parse("http://fhir.example.org/open/Location/1/_history/2").unwrap();
        assert!(identity.is_absolute());
        assert_eq!(
            identity.base().map(|b| b.as_str()),
            Some("http://fhir.example.org/open")
        );
        assert_eq!(identity.resource_type(), "Location");
        assert_eq!(identity.id(), Some("1"));
        assert_eq!(identity.version_id(), Some("2"));
        assert_eq!(
            identity.to_string(),
            "http://fhir.example.org/open/Location/1/_history/2"
        );
    }

    #[test]
    fn test_parse_absolute_type_only() {
        let identity = ResourceIdentity::parse("https://example.org/fhir/Patient").unwrap();
        assert_eq!(identity.resource_type(), "Patient");
        assert_eq!(identity.id(), None);
        assert_eq!(identity.to_string(), "https://example.org/fhir/Patient");

        let identity = ResourceIdentity::parse("http://server.example.org/FHIR/Patient").unwrap();
        assert_eq!(identity.resource_type(), "Patient");
        assert_eq!(identity.id(), None);
        assert_eq!(
            identity.base().map(|u| u.as_str().trim_end_matches('/')),
            Some("http://server.example.org/FHIR")
        );
        assert_eq!(identity.to_string(), "http://server.example.org/FHIR/Patient");

        let identity =
            ResourceIdentity::parse("http://server.example.org/FHIR/Patient/Abc").unwrap();
        assert_eq!(identity.resource_type(), "Patient");
        assert_eq!(identity.id(), Some("Abc"));
    }

    #[test_case("" ; "empty")]
    #[test_case("location/1" ; "lowercase type")]
    #[test_case("Location/1/_history" ; "missing version")]
    #[test_case("Location/1/_history/2/extra" ; "trailing segment")]
    #[test_case("fhir/Location/1" ; "relative prefix")]
    #[test_case("Location/has space" ; "bad id")]
    fn test_parse_invalid(input: &str) {
        assert!(matches!(
            ResourceIdentity::parse(input),
            Err(FhirError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_id_length_limit() {
        let long_id = "a".repeat(65);
        assert!(ResourceIdentity::build("Patient", &long_id).is_err());
        assert!(ResourceIdentity::build("Patient", &"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_build_and_version_manipulation() {
        let identity = ResourceIdentity::build_versioned("Location", "1", "7").unwrap();
        assert_eq!(identity.to_string(), "Location/1/_history/7");
        assert_eq!(identity.without_version().to_string(), "Location/1");
        assert!(!identity.without_version().has_version());
    }

    #[test]
    fn test_type_identity_rejects_version() {
        let identity = ResourceIdentity::for_type("Patient").unwrap();
        assert!(identity.with_version("1").is_err());
    }

    #[test]
    fn test_with_base_and_make_relative() {
        let identity =
            ResourceIdentity::build_with_base("http://example.org/fhir/", "Location", "1").unwrap();
        assert_eq!(identity.to_string(), "http://example.org/fhir/Location/1");
        assert_eq!(identity.make_relative().to_string(), "Location/1");
        assert!(ResourceIdentity::build("Location", "1")
            .unwrap()
            .with_base("example.org")
            .is_err());
    }

    #[test]
    fn test_to_url_relative_keeps_endpoint_path() {
        let endpoint = Url::parse("http://example.org/open").unwrap();
        let identity = ResourceIdentity::parse("Location/1").unwrap();
        assert_eq!(
            identity.to_url(&endpoint).unwrap().as_str(),
            "http://example.org/open/Location/1"
        );

        let endpoint = Url::parse("http://example.org/open/").unwrap();
        assert_eq!(
            identity.to_url(&endpoint).unwrap().as_str(),
            "http://example.org/open/Location/1"
        );
    }

    #[test]
    fn test_to_url_absolute_ignores_endpoint() {
        let endpoint = Url::parse("http://example.org/open").unwrap();
        let identity = ResourceIdentity::parse("http://other.org/fhir/Patient/9").unwrap();
        assert_eq!(
            identity.to_url(&endpoint).unwrap().as_str(),
            "http://other.org/fhir/Patient/9"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let identity = ResourceIdentity::parse("Patient/1/_history/2").unwrap();
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, "\"Patient/1/_history/2\"");
        let back: ResourceIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}
