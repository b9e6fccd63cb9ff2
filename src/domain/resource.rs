//! FHIR resources exchanged with the server
//!
//! The full resource model lives on the server side. The client only needs
//! enough structure to address resources and to round-trip them: a typed
//! resource keeps every JSON member it does not model in `extra`, so a
//! read-modify-update cycle never drops data.

use super::errors::FhirError;
use super::identity::ResourceIdentity;
use super::meta::{Coding, Meta};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON member carrying the resource type name
pub const RESOURCE_TYPE_FIELD: &str = "resourceType";

/// Behaviour shared by every resource the client can send or receive
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Resource type name, e.g. `Patient`
    fn resource_type(&self) -> &str;

    /// Logical id
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    fn meta(&self) -> Option<&Meta>;

    /// Resource metadata, created empty when missing
    fn meta_mut(&mut self) -> &mut Meta;

    /// Version id from `meta.versionId`
    fn version_id(&self) -> Option<&str> {
        self.meta().and_then(|m| m.version_id.as_deref())
    }

    /// Relative identity of this resource version
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidIdentity`] if the resource has no id.
    fn resource_identity(&self) -> Result<ResourceIdentity, FhirError> {
        let id = self.id().ok_or_else(|| {
            FhirError::InvalidIdentity(format!(
                "{} resource has no id",
                self.resource_type()
            ))
        })?;
        let identity = ResourceIdentity::build(self.resource_type(), id)?;
        match self.version_id() {
            Some(vid) => identity.with_version(vid),
            None => Ok(identity),
        }
    }

    /// Decodes a resource received from the server
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidResponse`] if the JSON is not a resource
    /// of this kind.
    fn from_resource_json(value: Value) -> Result<Self, FhirError>
    where
        Self: Sized;

    /// Serializes the resource with its `resourceType` member
    fn to_json(&self) -> Result<Value, FhirError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| FhirError::InvalidResponse(format!("cannot serialize resource: {e}")))?;
        if let Value::Object(map) = &mut value {
            map.entry(RESOURCE_TYPE_FIELD)
                .or_insert_with(|| Value::String(self.resource_type().to_string()));
        }
        Ok(value)
    }
}

/// A resource whose type is known at compile time
pub trait TypedResource: Resource {
    const TYPE_NAME: &'static str;

    /// Older names the server may still use for this type
    const ALIASES: &'static [&'static str] = &[];

    fn accepts_type(name: &str) -> bool {
        name == Self::TYPE_NAME || Self::ALIASES.contains(&name)
    }
}

/// Decodes a JSON resource into `T`, checking its `resourceType`
pub fn from_json<T: TypedResource>(mut value: Value) -> Result<T, FhirError> {
    let map = value.as_object_mut().ok_or_else(|| {
        FhirError::InvalidResponse(format!("expected a {} object", T::TYPE_NAME))
    })?;

    match map.remove(RESOURCE_TYPE_FIELD) {
        Some(Value::String(name)) if T::accepts_type(&name) => {}
        Some(Value::String(name)) => {
            return Err(FhirError::InvalidResponse(format!(
                "expected resource type {}, got {name}",
                T::TYPE_NAME
            )))
        }
        _ => {
            return Err(FhirError::InvalidResponse(format!(
                "{} body has no resourceType",
                T::TYPE_NAME
            )))
        }
    }

    serde_json::from_value(value)
        .map_err(|e| FhirError::InvalidResponse(format!("invalid {}: {e}", T::TYPE_NAME)))
}

/// Implements [`Resource`] and [`TypedResource`] for a struct with
/// `id: Option<String>` and `meta: Option<Meta>` fields
macro_rules! impl_resource {
    ($ty:ty, $name:literal) => {
        impl_resource!($ty, $name, []);
    };
    ($ty:ty, $name:literal, [$($alias:literal),*]) => {
        impl $crate::domain::resource::Resource for $ty {
            fn resource_type(&self) -> &str {
                $name
            }

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: Option<String>) {
                self.id = id;
            }

            fn meta(&self) -> Option<&$crate::domain::meta::Meta> {
                self.meta.as_ref()
            }

            fn meta_mut(&mut self) -> &mut $crate::domain::meta::Meta {
                self.meta.get_or_insert_with(Default::default)
            }

            fn from_resource_json(
                value: ::serde_json::Value,
            ) -> ::std::result::Result<Self, $crate::domain::errors::FhirError> {
                $crate::domain::resource::from_json(value)
            }
        }

        impl $crate::domain::resource::TypedResource for $ty {
            const TYPE_NAME: &'static str = $name;
            const ALIASES: &'static [&'static str] = &[$($alias),*];
        }
    };
}

pub(crate) use impl_resource;

/// Any resource, with its members kept as JSON
///
/// # Example
///
/// ```
/// use fhir_rest_client::domain::{DynamicResource, Location, Resource};
/// use serde_json::json;
///
/// let raw: DynamicResource = serde_json::from_value(json!({
///     "resourceType": "Location",
///     "id": "1",
///     "address": { "city": "Den Burg" }
/// })).unwrap();
///
/// assert_eq!(raw.resource_type(), "Location");
/// let location: Location = raw.to_typed().unwrap();
/// assert_eq!(location.address.unwrap().city.as_deref(), Some("Den Burg"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DynamicResource {
    /// Create an empty resource of the given type
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            meta: None,
            fields: Map::new(),
        }
    }

    /// Set a JSON member
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Wrap a typed resource
    pub fn from_resource<T: Resource>(resource: &T) -> Result<Self, FhirError> {
        serde_json::from_value(resource.to_json()?)
            .map_err(|e| FhirError::InvalidResponse(format!("cannot convert resource: {e}")))
    }

    /// Convert into a typed resource
    pub fn to_typed<T: TypedResource>(&self) -> Result<T, FhirError> {
        let value = serde_json::to_value(self)
            .map_err(|e| FhirError::InvalidResponse(format!("cannot convert resource: {e}")))?;
        from_json(value)
    }

    pub fn is<T: TypedResource>(&self) -> bool {
        T::accepts_type(&self.resource_type)
    }
}

impl Resource for DynamicResource {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut Meta {
        self.meta.get_or_insert_with(Default::default)
    }

    fn from_resource_json(value: Value) -> Result<Self, FhirError> {
        serde_json::from_value(value)
            .map_err(|e| FhirError::InvalidResponse(format!("invalid resource: {e}")))
    }
}

/// Business identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            use_: None,
            system: Some(system.into()),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Phone, fax, email or similar contact detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
}

impl ContactPoint {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
            use_: None,
        }
    }
}

/// Reference from one resource to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Target identity, when the reference is a literal `Type/id` or URL
    pub fn identity(&self) -> Option<ResourceIdentity> {
        self.reference
            .as_deref()
            .and_then(|r| ResourceIdentity::parse(r).ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Patient, "Patient");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Location, "Location");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(Organization, "Organization");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_resource!(DiagnosticReport, "DiagnosticReport");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_round_trip_keeps_unknown_members() {
        let value = json!({
            "resourceType": "Patient",
            "id": "example",
            "meta": { "versionId": "2" },
            "identifier": [{ "system": "http://hl7.org/test/1", "value": "3141" }],
            "maritalStatus": { "text": "married" }
        });

        let patient: Patient = from_json(value).unwrap();
        assert_eq!(patient.identifier.len(), 1);
        assert!(patient.extra.contains_key("maritalStatus"));
        assert!(!patient.extra.contains_key(RESOURCE_TYPE_FIELD));

        let back = patient.to_json().unwrap();
        assert_eq!(back["resourceType"], "Patient");
        assert_eq!(back["maritalStatus"]["text"], "married");
    }

    #[test]
    fn test_from_json_rejects_wrong_type() {
        let value = json!({ "resourceType": "Location", "id": "1" });
        let result: Result<Patient, _> = from_json(value);
        assert!(matches!(result, Err(FhirError::InvalidResponse(_))));
    }

    #[test]
    fn test_from_json_requires_resource_type() {
        let result: Result<Patient, _> = from_json(json!({ "id": "1" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_resource_identity_includes_version() {
        let mut location = Location {
            id: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(location.resource_identity().unwrap().to_string(), "Location/1");

        location.meta_mut().version_id = Some("4".to_string());
        assert_eq!(
            location.resource_identity().unwrap().to_string(),
            "Location/1/_history/4"
        );
    }

    #[test]
    fn test_resource_identity_requires_id() {
        let organization = Organization::default();
        assert!(organization.resource_identity().is_err());
    }

    #[test]
    fn test_dynamic_resource_conversion() {
        let organization = Organization {
            name: Some("Furore".to_string()),
            identifier: vec![Identifier::new("http://hl7.org/test/1", "3141")],
            telecom: vec![ContactPoint::new("phone", "+31-20-3467171")],
            ..Default::default()
        };

        let dynamic = DynamicResource::from_resource(&organization).unwrap();
        assert_eq!(dynamic.resource_type(), "Organization");
        assert!(dynamic.is::<Organization>());
        assert!(!dynamic.is::<Patient>());

        let typed: Organization = dynamic.to_typed().unwrap();
        assert_eq!(typed, organization);
    }

    #[test]
    fn test_reference_identity() {
        let reference = Reference {
            reference: Some("Patient/pat1".to_string()),
            display: None,
        };
        assert_eq!(reference.identity().unwrap().id(), Some("pat1"));

        let contained = Reference {
            reference: Some("#p1".to_string()),
            display: None,
        };
        assert!(contained.identity().is_none());
    }
}
