//! External system integrations.
//!
//! - [`fhir`] - FHIR server integration over the REST protocol
//!
//! # Design Pattern
//!
//! Adapters isolate the HTTP stack from the domain model: requests are built
//! as plain values, sent by a client, and their responses decoded into domain
//! types. No `reqwest` error type leaves this module.
//!
//! ```rust,no_run
//! use fhir_rest_client::adapters::fhir::FhirClient;
//! use fhir_rest_client::config::{secret_string, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = ServerConfig::new("https://fhir.example.org/r4");
//! config.auth_type = "bearer".to_string();
//! config.token = Some(secret_string("token".to_string()));
//!
//! let client = FhirClient::new(config)?;
//! let capabilities = client.capabilities().await?;
//! println!("{:?}", capabilities.fhir_version);
//! # Ok(())
//! # }
//! ```

pub mod fhir;
