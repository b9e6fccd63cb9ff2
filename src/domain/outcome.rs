//! OperationOutcome (error details) and Parameters (operation in/out)

use super::meta::Meta;
use super::resource::{impl_resource, DynamicResource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: String,

    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Issue {
    /// An error-severity issue
    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            severity: "error".to_string(),
            code: code.into(),
            diagnostics: Some(diagnostics.into()),
            details: None,
        }
    }

    fn text(&self) -> Option<String> {
        if let Some(d) = &self.diagnostics {
            return Some(d.clone());
        }
        self.details
            .as_ref()
            .and_then(|d| d.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Outcome returned by the server when an interaction fails
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default)]
    pub issue: Vec<Issue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(OperationOutcome, "OperationOutcome");

impl OperationOutcome {
    /// One line per issue: `severity/code: text`
    pub fn summary(&self) -> String {
        if self.issue.is_empty() {
            return "no issues reported".to_string();
        }
        self.issue
            .iter()
            .map(|i| match i.text() {
                Some(text) => format!("{}/{}: {}", i.severity, i.code, text),
                None => format!("{}/{}", i.severity, i.code),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|i| i.severity == "error" || i.severity == "fatal")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<DynamicResource>,
}

/// Input and output of operations such as `$meta`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Parameters, "Parameters");

impl Parameters {
    /// Parameters holding a single `meta` parameter, as `$meta-add` and
    /// `$meta-delete` expect
    pub fn with_meta(meta: &Meta) -> Self {
        Self {
            parameter: vec![Parameter {
                name: "meta".to_string(),
                value_meta: Some(meta.labels_only()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// First `valueMeta` named `name`
    pub fn meta_value(&self, name: &str) -> Option<&Meta> {
        self.parameter
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value_meta.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meta::Coding;
    use crate::domain::resource::{from_json, Resource};
    use serde_json::json;

    #[test]
    fn test_outcome_summary() {
        let outcome: OperationOutcome = from_json(json!({
            "resourceType": "OperationOutcome",
            "issue": [
                { "severity": "error", "code": "not-found", "diagnostics": "Location/45qq54 not found" },
                { "severity": "warning", "code": "processing", "details": { "text": "slow" } },
                { "severity": "information", "code": "informational" }
            ]
        }))
        .unwrap();

        assert!(outcome.has_errors());
        assert_eq!(
            outcome.summary(),
            "error/not-found: Location/45qq54 not found; warning/processing: slow; information/informational"
        );
    }

    #[test]
    fn test_with_meta_drops_version() {
        let meta = Meta {
            version_id: Some("3".to_string()),
            ..Meta::new().with_tag(Coding::new("http://mysystem.com/tag", "t1"))
        };

        let parameters = Parameters::with_meta(&meta);
        let json = parameters.to_json().unwrap();
        assert_eq!(json["resourceType"], "Parameters");
        assert_eq!(json["parameter"][0]["name"], "meta");
        assert_eq!(json["parameter"][0]["valueMeta"]["tag"][0]["code"], "t1");
        assert!(json["parameter"][0]["valueMeta"].get("versionId").is_none());
    }

    #[test]
    fn test_meta_value_lookup() {
        let parameters: Parameters = from_json(json!({
            "resourceType": "Parameters",
            "parameter": [
                { "name": "return", "valueMeta": { "profile": ["http://x/Profile/1"] } }
            ]
        }))
        .unwrap();

        let meta = parameters.meta_value("return").unwrap();
        assert!(meta.has_profile("http://x/Profile/1"));
        assert!(parameters.meta_value("missing").is_none());
    }
}
