//! FHIR REST adapter
//!
//! This module provides request construction, response interpretation and
//! the async and blocking clients built on them.

pub mod blocking;
pub mod client;
pub mod request;
pub mod response;
pub mod search;

pub use blocking::BlockingFhirClient;
pub use client::FhirClient;
pub use request::{FhirRequest, RequestFactory, RequestSettings, Scope};
pub use response::{FhirResponse, ResponseDetails};
pub use search::SearchParams;
