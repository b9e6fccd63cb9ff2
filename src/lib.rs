// FHIR REST Client - Command-line client for HL7 FHIR servers
// Copyright (c) 2025 FHIR REST Client Contributors
// Licensed under the MIT License

//! # FHIR REST Client
//!
//! A typed client for the HL7 FHIR RESTful API, usable from async code,
//! from blocking code, and as the `fhir-client` command-line tool.
//!
//! ## Overview
//!
//! This library provides:
//! - **Instance interactions**: read, vread, update (optionally version-aware),
//!   delete, conditional update and delete
//! - **Type interactions**: create and search with `_id`, `_include`, `_sort`
//!   and `_count`, plus paging through `next`/`previous` bundle links
//! - **History** at instance, type and system level with `_since` and `_count`
//! - **Metadata**: `$meta`, `$meta-add` and `$meta-delete` for profiles, tags
//!   and security labels
//! - **Capabilities** via `GET [base]/metadata`
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`adapters`] - The HTTP client, request construction and response decoding
//! - [`domain`] - Resources, identities, bundles and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fhir_rest_client::adapters::fhir::{FhirClient, SearchParams};
//! use fhir_rest_client::domain::{Patient, ResourceIdentity};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FhirClient::from_url("https://fhir.example.org/r4")?;
//!
//!     let identity = ResourceIdentity::parse("Patient/example")?;
//!     let patient: Patient = client.read(&identity).await?;
//!     println!("Read version {:?}", patient.meta.as_ref().and_then(|m| m.version_id.clone()));
//!
//!     let bundle = client
//!         .search::<Patient>(&SearchParams::new().criterion("family", "Smith"))
//!         .await?;
//!     println!("Found {} patients", bundle.entry.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`]. A non-success answer
//! from the server surfaces as [`domain::FhirError::OperationFailed`], carrying
//! the HTTP status and any `OperationOutcome` the server returned:
//!
//! ```rust,no_run
//! use fhir_rest_client::adapters::fhir::FhirClient;
//! use fhir_rest_client::domain::{Patient, ResourceIdentity};
//!
//! # async fn example(client: &FhirClient) -> fhir_rest_client::domain::Result<()> {
//! let identity = ResourceIdentity::parse("Patient/missing")?;
//! match client.read::<Patient>(&identity).await {
//!     Ok(patient) => println!("{:?}", patient.id),
//!     Err(e) if e.is_not_found() => println!("No such patient"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The client logs with the `tracing` crate. Requests and responses are
//! logged at debug level, retries at warn level.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
