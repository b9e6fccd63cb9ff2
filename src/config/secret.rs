//! Secure credential handling using the secrecy crate
//!
//! Passwords and bearer tokens read from the configuration are wrapped in
//! [`SecretString`], which zeroes memory on drop and redacts `Debug` output.
//! The `Authorization` header value is derived here so the raw credential
//! is exposed for as short a time as possible.
//!
//! # Example
//!
//! ```rust
//! use fhir_rest_client::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let token: SecretString = secret_string("abc123".to_string());
//! assert_eq!(token.expose_secret().as_str(), "abc123");
//! println!("{:?}", token); // Prints: Secret([REDACTED ...])
//! ```

use base64::{engine::general_purpose, Engine as _};
use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty or blank value
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string: zeroed on drop, redacted in `Debug`, explicit access only
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// `Authorization` value for HTTP basic authentication
pub fn basic_authorization(username: &str, password: &SecretString) -> SecretString {
    let mut credentials = format!("{username}:{}", password.expose_secret().as_str());
    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
    credentials.zeroize();
    secret_string(format!("Basic {encoded}"))
}

/// `Authorization` value for a bearer token
pub fn bearer_authorization(token: &SecretString) -> SecretString {
    secret_string(format!("Bearer {}", token.expose_secret().as_str()))
}
