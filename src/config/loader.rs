//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ClientConfig;
use super::secret::secret_string;
use crate::domain::errors::ClientError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "FHIR_CLIENT";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ClientConfig`]
/// 4. Applies environment variable overrides (`FHIR_CLIENT_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use fhir_rest_client::config::loader::load_config;
///
/// let config = load_config("fhir-client.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ClientError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ClientError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text the same way [`load_config`] parses a file
///
/// # Errors
///
/// Returns an error on missing variables, invalid TOML or failed validation
pub fn parse_config(contents: &str) -> Result<ClientConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ClientConfig = toml::from_str(&contents)
        .map_err(|e| ClientError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ClientError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ClientError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(ClientError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_override(section: &str, key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{section}_{key}")).ok()
}

fn parse_override<T: std::str::FromStr>(section: &str, key: &str) -> Result<Option<T>> {
    match env_override(section, key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ClientError::Configuration(format!(
                "Invalid value '{raw}' for {ENV_PREFIX}_{section}_{key}"
            ))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using the `FHIR_CLIENT_*` prefix
///
/// Variables follow the pattern `FHIR_CLIENT_<SECTION>_<KEY>`, for example
/// `FHIR_CLIENT_SERVER_BASE_URL` or `FHIR_CLIENT_LOGGING_LOCAL_PATH`.
fn apply_env_overrides(config: &mut ClientConfig) -> Result<()> {
    if let Some(val) = env_override("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }

    let server = &mut config.server;
    if let Some(val) = env_override("SERVER", "BASE_URL") {
        server.base_url = val;
    }
    if let Some(val) = env_override("SERVER", "PREFERRED_FORMAT") {
        server.preferred_format = val.parse().map_err(ClientError::Configuration)?;
    }
    if let Some(val) = parse_override("SERVER", "USE_FORMAT_PARAM")? {
        server.use_format_param = val;
    }
    if let Some(val) = env_override("SERVER", "FHIR_VERSION") {
        server.fhir_version = Some(val);
    }
    if let Some(val) = parse_override("SERVER", "VERSION_AWARE_UPDATE")? {
        server.version_aware_update = val;
    }
    if let Some(val) = parse_override("SERVER", "RETURN_REPRESENTATION")? {
        server.return_representation = val;
    }
    if let Some(val) = env_override("SERVER", "AUTH_TYPE") {
        server.auth_type = val;
    }
    if let Some(val) = env_override("SERVER", "USERNAME") {
        server.username = Some(val);
    }
    if let Some(val) = env_override("SERVER", "PASSWORD") {
        server.password = Some(secret_string(val));
    }
    if let Some(val) = env_override("SERVER", "TOKEN") {
        server.token = Some(secret_string(val));
    }
    if let Some(val) = parse_override("SERVER", "TLS_VERIFY")? {
        server.tls_verify = val;
    }
    if let Some(val) = env_override("SERVER", "TLS_CA_CERT") {
        server.tls_ca_cert = Some(val);
    }
    if let Some(val) = parse_override("SERVER", "TIMEOUT_SECONDS")? {
        server.timeout_seconds = val;
    }
    if let Some(val) = parse_override("SERVER", "RETRY_MAX_ATTEMPTS")? {
        server.retry.max_attempts = val;
    }

    if let Some(val) = parse_override("LOGGING", "LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
    if let Some(val) = parse_override("LOGGING", "JSON_CONSOLE")? {
        config.logging.json_console = val;
    }

    Ok(())
}

/// Contents written by `fhir-client init`
pub fn sample_config() -> &'static str {
    r#"# FHIR client configuration

[application]
log_level = "info"

[server]
base_url = "http://localhost:8080/fhir"
preferred_format = "json"
use_format_param = false
# fhir_version = "4.0"
version_aware_update = false
return_representation = true
auth_type = "none"
# auth_type = "basic"
# username = "fhir_user"
# password = "${FHIR_CLIENT_PASSWORD}"
# auth_type = "bearer"
# token = "${FHIR_CLIENT_TOKEN}"
tls_verify = true
timeout_seconds = 60

[server.retry]
max_attempts = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LOADER_TEST_VAR", "test_value");
        let input = "password = \"${LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LOADER_MISSING_VAR");
        let input = "password = \"${LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("LOADER_COMMENTED_VAR");
        let input = "# token = \"${LOADER_COMMENTED_VAR}\"\nbase = 1";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = parse_config(sample_config()).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8080/fhir");
        assert_eq!(config.server.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[server]
base_url = "https://fhir.example.org/r4"
preferred_format = "xml"
use_format_param = true
fhir_version = "4.0"
auth_type = "basic"
username = "user"
password = "pass"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.server.base_url, "https://fhir.example.org/r4");
        assert_eq!(config.server.preferred_format, ResourceFormat::Xml);
        assert!(config.server.use_format_param);
        assert_eq!(config.server.fhir_version.as_deref(), Some("4.0"));
        assert!(config.server.tls_verify);
        assert_eq!(config.logging.local_rotation, "daily");
    }
}
