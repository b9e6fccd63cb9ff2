//! Server capability statement (`GET [base]/metadata`)

use super::meta::Meta;
use super::resource::impl_resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a REST capability describes a server or a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestfulMode {
    Server,
    Client,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Software {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestResource {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rest {
    pub mode: RestfulMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<RestResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<Software>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rest: Vec<Rest>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(CapabilityStatement, "CapabilityStatement", ["Conformance"]);

impl CapabilityStatement {
    /// REST capabilities declared for server mode
    pub fn server_rest(&self) -> Option<&Rest> {
        self.rest.iter().find(|r| r.mode == RestfulMode::Server)
    }

    /// True when the server declares support for `resource_type`
    pub fn supports_resource(&self, resource_type: &str) -> bool {
        self.server_rest()
            .is_some_and(|r| r.resource.iter().any(|res| res.resource_type == resource_type))
    }
}
