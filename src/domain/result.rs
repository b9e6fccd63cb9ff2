//! Result type alias for the client

use super::errors::ClientError;

/// Result type alias for client operations
///
/// This is a convenience type alias that uses `ClientError` as the error type.
///
/// # Examples
///
/// ```
/// use fhir_rest_client::domain::result::Result;
/// use fhir_rest_client::domain::errors::ClientError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ClientError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ClientError>;
