//! Bundles returned by search and history interactions, and paging links

use super::errors::FhirError;
use super::meta::Meta;
use super::resource::{impl_resource, DynamicResource, TypedResource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Direction to move in when following a bundle's paging links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageDirection {
    First,
    Previous,
    Next,
    Last,
}

impl PageDirection {
    /// Link relations that name this direction
    fn relations(self) -> &'static [&'static str] {
        match self {
            PageDirection::First => &["first"],
            PageDirection::Previous => &["previous", "prev"],
            PageDirection::Next => &["next"],
            PageDirection::Last => &["last"],
        }
    }
}

impl fmt::Display for PageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relations()[0])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<DynamicResource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<EntrySearch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<EntryRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<EntryResponse>,
}

impl BundleEntry {
    /// True for a history entry recording a deletion
    pub fn is_deleted(&self) -> bool {
        if self.resource.is_some() {
            return false;
        }
        let deleted_by_request = self
            .request
            .as_ref()
            .is_some_and(|r| r.method.eq_ignore_ascii_case("DELETE"));
        let gone = self
            .response
            .as_ref()
            .is_some_and(|r| r.status.trim_start().starts_with("410"));
        deleted_by_request || gone
    }
}

/// Container of resources returned by search and history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Bundle, "Bundle");

impl Bundle {
    /// URL of the paging link for `direction`, if the server supplied one
    pub fn link_for(&self, direction: PageDirection) -> Option<&str> {
        let relations = direction.relations();
        self.link
            .iter()
            .find(|l| relations.iter().any(|r| l.relation.eq_ignore_ascii_case(r)))
            .map(|l| l.url.as_str())
    }

    pub fn self_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation.eq_ignore_ascii_case("self"))
            .map(|l| l.url.as_str())
    }

    /// Resources present in the bundle, in entry order
    pub fn resources(&self) -> impl Iterator<Item = &DynamicResource> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }

    /// Resources of type `T`, converted
    pub fn resources_of<T: TypedResource>(&self) -> Result<Vec<T>, FhirError> {
        self.resources()
            .filter(|r| r.is::<T>())
            .map(|r| r.to_typed::<T>())
            .collect()
    }

    /// Number of entries recording a deletion
    pub fn deleted_count(&self) -> usize {
        self.entry.iter().filter(|e| e.is_deleted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::{from_json, DiagnosticReport, Patient};
    use serde_json::json;

    fn search_bundle() -> Bundle {
        from_json(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "link": [
                { "relation": "self", "url": "http://example.org/fhir/DiagnosticReport?_count=1" },
                { "relation": "next", "url": "http://example.org/fhir?_getpages=abc&_offset=1" },
                { "relation": "prev", "url": "http://example.org/fhir?_getpages=abc&_offset=0" }
            ],
            "entry": [
                {
                    "fullUrl": "http://example.org/fhir/DiagnosticReport/101",
                    "resource": {
                        "resourceType": "DiagnosticReport",
                        "id": "101",
                        "subject": { "reference": "Patient/pat1" }
                    },
                    "search": { "mode": "match" }
                },
                {
                    "resource": { "resourceType": "Patient", "id": "pat1" },
                    "search": { "mode": "include" }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_link_lookup_accepts_prev_alias() {
        let bundle = search_bundle();
        assert_eq!(
            bundle.link_for(PageDirection::Next),
            Some("http://example.org/fhir?_getpages=abc&_offset=1")
        );
        assert_eq!(
            bundle.link_for(PageDirection::Previous),
            Some("http://example.org/fhir?_getpages=abc&_offset=0")
        );
        assert_eq!(bundle.link_for(PageDirection::Last), None);
        assert!(bundle.self_link().is_some());
    }

    #[test]
    fn test_resources_of_filters_by_type() {
        let bundle = search_bundle();
        let reports: Vec<DiagnosticReport> = bundle.resources_of().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].subject.as_ref().and_then(|s| s.reference.as_deref()),
            Some("Patient/pat1")
        );

        let patients: Vec<Patient> = bundle.resources_of().unwrap();
        assert_eq!(patients.len(), 1);
    }

    #[test]
    fn test_history_deleted_entries() {
        let bundle: Bundle = from_json(json!({
            "resourceType": "Bundle",
            "type": "history",
            "entry": [
                { "request": { "method": "DELETE", "url": "Patient/1" } },
                {
                    "resource": { "resourceType": "Patient", "id": "1" },
                    "request": { "method": "PUT", "url": "Patient/1" }
                },
                { "response": { "status": "410 Gone" } }
            ]
        }))
        .unwrap();

        assert_eq!(bundle.resources().count(), 1);
        assert_eq!(bundle.deleted_count(), 2);
    }

    #[test]
    fn test_page_direction_display() {
        assert_eq!(PageDirection::Previous.to_string(), "previous");
        assert_eq!(PageDirection::First.to_string(), "first");
    }
}
