//! Domain models and types for the FHIR client.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Resource identities** ([`ResourceIdentity`]) for `[base/]Type/id[/_history/vid]`
//! - **Resources** ([`Patient`], [`Location`], [`Organization`], [`DiagnosticReport`],
//!   [`DynamicResource`]) and the [`Resource`] / [`TypedResource`] traits
//! - **Protocol containers** ([`Bundle`], [`Parameters`], [`OperationOutcome`],
//!   [`CapabilityStatement`])
//! - **Metadata** ([`Meta`], [`Coding`]) with `$meta-add` / `$meta-delete` semantics
//! - **Error types** ([`ClientError`], [`FhirError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ClientError>`]:
//!
//! ```rust
//! use fhir_rest_client::domain::{ResourceIdentity, Result};
//!
//! fn example() -> Result<()> {
//!     let identity = ResourceIdentity::parse("Patient/1")?;
//!     assert_eq!(identity.resource_type(), "Patient");
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod capability;
pub mod errors;
pub mod format;
pub mod identity;
pub mod meta;
pub mod outcome;
pub mod resource;
pub mod result;

// Re-export commonly used types for convenience
pub use bundle::{Bundle, BundleEntry, BundleLink, PageDirection};
pub use capability::{CapabilityStatement, RestfulMode};
pub use errors::{ClientError, FhirError};
pub use format::ResourceFormat;
pub use identity::ResourceIdentity;
pub use meta::{Coding, Meta};
pub use outcome::{Issue, OperationOutcome, Parameters};
pub use resource::{
    from_json, Address, CodeableConcept, ContactPoint, DiagnosticReport, DynamicResource,
    HumanName, Identifier, Location, Organization, Patient, Reference, Resource, TypedResource,
};
pub use result::Result;
