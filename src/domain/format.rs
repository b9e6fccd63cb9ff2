//! Wire format negotiation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const JSON_CONTENT_TYPE: &str = "application/fhir+json";
pub const XML_CONTENT_TYPE: &str = "application/fhir+xml";

const JSON_CONTENT_TYPES: &[&str] = &[
    JSON_CONTENT_TYPE,
    "application/json+fhir",
    "application/json",
    "text/json",
];
const XML_CONTENT_TYPES: &[&str] = &[
    XML_CONTENT_TYPE,
    "application/xml+fhir",
    "application/xml",
    "text/xml",
];

/// Resource serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    #[default]
    Json,
    Xml,
}

impl ResourceFormat {
    /// MIME type used in `Accept` and `Content-Type`
    pub fn content_type(self) -> &'static str {
        match self {
            ResourceFormat::Json => JSON_CONTENT_TYPE,
            ResourceFormat::Xml => XML_CONTENT_TYPE,
        }
    }

    /// Value of the `_format` query parameter
    pub fn format_param(self) -> &'static str {
        match self {
            ResourceFormat::Json => "json",
            ResourceFormat::Xml => "xml",
        }
    }

    /// Format named by a `Content-Type` header value
    ///
    /// Parameters such as `charset` are ignored, as is case.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if JSON_CONTENT_TYPES.contains(&mime.as_str()) {
            Some(ResourceFormat::Json)
        } else if XML_CONTENT_TYPES.contains(&mime.as_str()) {
            Some(ResourceFormat::Xml)
        } else {
            None
        }
    }
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_param())
    }
}

impl FromStr for ResourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResourceFormat::Json),
            "xml" => Ok(ResourceFormat::Xml),
            other => Self::from_content_type(other).ok_or_else(|| {
                format!("Unknown resource format '{s}'. Must be one of: json, xml")
            }),
        }
    }
}
