//! Asynchronous FHIR REST client

use super::request::{
    authorization_header, FhirRequest, RequestFactory, RequestSettings, Scope,
    META_ADD_OPERATION, META_DELETE_OPERATION,
};
use super::response::{FhirResponse, ResponseDetails};
use super::search::SearchParams;
use crate::config::{SecretString, ServerConfig};
use crate::domain::{
    Bundle, CapabilityStatement, ClientError, DynamicResource, FhirError, Meta, OperationOutcome,
    PageDirection, Parameters, Resource, ResourceFormat, ResourceIdentity, Result, TypedResource,
};
use crate::{log_request, log_response, log_retry_attempt};
use chrono::{DateTime, Utc};
use reqwest::{Certificate, Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use url::Url;

/// Name of the output parameter of `$meta`, `$meta-add` and `$meta-delete`
const META_RETURN_PARAMETER: &str = "return";

/// Client for one FHIR server endpoint
///
/// Requests are sent one at a time; the status line and headers of the most
/// recent response are available through [`FhirClient::last_response`].
///
/// # Example
///
/// ```no_run
/// use fhir_rest_client::adapters::fhir::{FhirClient, SearchParams};
/// use fhir_rest_client::config::ServerConfig;
/// use fhir_rest_client::domain::{Patient, ResourceIdentity};
///
/// # async fn example() -> fhir_rest_client::domain::Result<()> {
/// let client = FhirClient::new(ServerConfig::new("http://localhost:8080/fhir"))?;
///
/// let patient: Patient = client.read(&ResourceIdentity::parse("Patient/1")?).await?;
/// let bundle = client
///     .search::<Patient>(&SearchParams::new().criterion("name", "Eve"))
///     .await?;
/// println!("{:?} {}", patient.id, bundle.entry.len());
/// # Ok(())
/// # }
/// ```
pub struct FhirClient {
    http: Client,
    requests: RequestFactory,
    authorization: Option<SecretString>,
    config: ServerConfig,
    last_response: RwLock<Option<ResponseDetails>>,
}

impl std::fmt::Debug for FhirClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FhirClient")
            .field("endpoint", &self.requests.endpoint().as_str())
            .field("settings", self.requests.settings())
            .finish_non_exhaustive()
    }
}

impl FhirClient {
    /// Create a client from server configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the CA certificate
    /// cannot be loaded or the HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate().map_err(ClientError::Configuration)?;

        let requests = RequestFactory::new(&config.base_url, RequestSettings::from(&config))?;
        let authorization = authorization_header(&config)?;

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(concat!("fhir-rest-client/", env!("CARGO_PKG_VERSION")));

        if !config.tls_verify {
            tracing::warn!(
                base_url = %config.base_url,
                "TLS certificate verification is disabled"
            );
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_path) = &config.tls_ca_cert {
            let pem = std::fs::read(ca_path).map_err(|e| {
                ClientError::Configuration(format!("Failed to read CA certificate {ca_path}: {e}"))
            })?;
            let certificate = Certificate::from_pem(&pem).map_err(|e| {
                ClientError::Configuration(format!("Invalid CA certificate {ca_path}: {e}"))
            })?;
            client_builder = client_builder.add_root_certificate(certificate);
        }

        let http = client_builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_url = %requests.endpoint(),
            format = %config.preferred_format,
            auth_type = %config.auth_type,
            "FHIR client created"
        );

        Ok(Self {
            http,
            requests,
            authorization,
            config,
            last_response: RwLock::new(None),
        })
    }

    /// Create a client for `base_url` with default settings
    pub fn from_url(base_url: &str) -> Result<Self> {
        Self::new(ServerConfig::new(base_url))
    }

    /// Service base URL
    pub fn endpoint(&self) -> &Url {
        self.requests.endpoint()
    }

    pub fn preferred_format(&self) -> ResourceFormat {
        self.requests.settings().format
    }

    /// Switch between `Accept` header and `_format` parameter negotiation
    pub fn set_use_format_param(&mut self, use_format_param: bool) {
        self.requests.settings_mut().use_format_param = use_format_param;
    }

    pub fn set_preferred_format(&mut self, format: ResourceFormat) {
        self.requests.settings_mut().format = format;
    }

    pub fn set_version_aware_update(&mut self, enabled: bool) {
        self.requests.settings_mut().version_aware_update = enabled;
    }

    /// Status line and headers of the most recent response
    pub fn last_response(&self) -> Option<ResponseDetails> {
        self.last_response
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Fetch the server's capability statement (`GET [base]/metadata`)
    pub async fn capabilities(&self) -> Result<CapabilityStatement> {
        let response = self.execute(self.requests.capabilities()?).await?;
        let statement: CapabilityStatement = response.require_resource()?;

        tracing::info!(
            fhir_version = statement.fhir_version.as_deref().unwrap_or("unknown"),
            "Fetched server capabilities"
        );
        Ok(statement)
    }

    /// Read a resource; a versioned identity performs a version read
    ///
    /// The returned resource must be of type `R`.
    pub async fn read<R: Resource>(&self, identity: &ResourceIdentity) -> Result<R> {
        let response = self.execute(self.requests.read(identity)?).await?;
        Ok(response.require_resource()?)
    }

    /// Read a resource of any type
    pub async fn read_dynamic(&self, identity: &ResourceIdentity) -> Result<DynamicResource> {
        self.read(identity).await
    }

    /// Create a resource on the server
    ///
    /// The resource is posted to its type's collection. The server's copy is
    /// returned, read back through `Location` when the response has no body.
    pub async fn create<R: Resource>(&self, resource: &R) -> Result<R> {
        let request = self
            .requests
            .create(resource.resource_type(), resource.to_json()?)?;
        let response = self.execute(request).await?;

        let created = self.returned_resource::<R>(response, None).await?;
        tracing::info!(
            resource_type = created.resource_type(),
            id = created.id().unwrap_or_default(),
            version = created.version_id().unwrap_or_default(),
            "Created resource"
        );
        Ok(created)
    }

    /// Update a resource by id
    ///
    /// With version-aware updates enabled, the resource's `meta.versionId`
    /// is sent as `If-Match`.
    pub async fn update<R: Resource>(&self, resource: &R) -> Result<R> {
        let identity = resource.resource_identity()?;
        let request =
            self.requests
                .update(&identity, resource.to_json()?, resource.version_id())?;
        let response = self.execute(request).await?;

        let updated = self
            .returned_resource::<R>(response, Some(identity.without_version()))
            .await?;
        tracing::info!(
            resource_type = updated.resource_type(),
            id = updated.id().unwrap_or_default(),
            version = updated.version_id().unwrap_or_default(),
            "Updated resource"
        );
        Ok(updated)
    }

    /// Update the resource matching `criteria` (`PUT [base]/Type?criteria`)
    pub async fn update_conditional<R: Resource>(
        &self,
        resource: &R,
        criteria: &SearchParams,
    ) -> Result<R> {
        let request = self.requests.update_conditional(
            resource.resource_type(),
            criteria,
            resource.to_json()?,
        )?;
        let response = self.execute(request).await?;
        self.returned_resource(response, None).await
    }

    /// Delete a resource; any version part of the identity is ignored
    ///
    /// Returns the `OperationOutcome` the server sent, if any.
    pub async fn delete(&self, identity: &ResourceIdentity) -> Result<Option<OperationOutcome>> {
        let response = self.execute(self.requests.delete(identity, None)?).await?;
        tracing::info!(identity = %identity.without_version(), "Deleted resource");
        Ok(outcome_of(&response))
    }

    /// Delete the given resource, with `If-Match` when version-aware
    pub async fn delete_resource<R: Resource>(
        &self,
        resource: &R,
    ) -> Result<Option<OperationOutcome>> {
        let identity = resource.resource_identity()?;
        let request = self.requests.delete(&identity, resource.version_id())?;
        let response = self.execute(request).await?;
        tracing::info!(identity = %identity.without_version(), "Deleted resource");
        Ok(outcome_of(&response))
    }

    /// Delete the resources of type `T` matching `criteria`
    pub async fn delete_conditional<T: TypedResource>(
        &self,
        criteria: &SearchParams,
    ) -> Result<Option<OperationOutcome>> {
        let request = self.requests.delete_conditional(T::TYPE_NAME, criteria)?;
        let response = self.execute(request).await?;
        Ok(outcome_of(&response))
    }

    /// Search resources of type `T`
    pub async fn search<T: TypedResource>(&self, params: &SearchParams) -> Result<Bundle> {
        self.search_type(T::TYPE_NAME, params).await
    }

    /// Search resources of a type named at runtime
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidIdentity`] without contacting the server when
    /// `resource_type` is not a valid type name.
    pub async fn search_type(&self, resource_type: &str, params: &SearchParams) -> Result<Bundle> {
        ResourceIdentity::for_type(resource_type)?;
        let request = self.requests.search(resource_type, params)?;
        let bundle: Bundle = self.execute(request).await?.require_resource()?;

        tracing::debug!(
            resource_type,
            total = bundle.total,
            entries = bundle.entry.len(),
            "Search completed"
        );
        Ok(bundle)
    }

    /// Search a single resource by id, optionally with included resources
    pub async fn search_by_id<T: TypedResource>(
        &self,
        id: &str,
        includes: &[&str],
    ) -> Result<Bundle> {
        let params = includes
            .iter()
            .fold(SearchParams::new().id(id), |params, path| params.include(*path));
        self.search::<T>(&params).await
    }

    /// Follow a paging link of `bundle`
    ///
    /// Returns `None` when the bundle has no link in that direction.
    pub async fn continue_bundle(
        &self,
        bundle: &Bundle,
        direction: PageDirection,
    ) -> Result<Option<Bundle>> {
        let Some(link) = bundle.link_for(direction) else {
            tracing::debug!(direction = %direction, "Bundle has no paging link");
            return Ok(None);
        };

        let url = self.requests.resolve_link(link)?;
        let page: Bundle = self
            .execute(self.requests.get(url)?)
            .await?
            .require_resource()?;
        Ok(Some(page))
    }

    /// History of one instance, or of a whole type for a type-level identity
    pub async fn history(
        &self,
        identity: &ResourceIdentity,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.history_in(Scope::of(identity), since, page_size).await
    }

    /// History of every resource of type `T`
    pub async fn type_history<T: TypedResource>(
        &self,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.history_in(Scope::Type(T::TYPE_NAME), since, page_size)
            .await
    }

    /// History of the whole server
    pub async fn whole_system_history(
        &self,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.history_in(Scope::System, since, page_size).await
    }

    async fn history_in(
        &self,
        scope: Scope<'_>,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        let request = self.requests.history(scope, since, page_size)?;
        let bundle: Bundle = self.execute(request).await?.require_resource()?;
        tracing::debug!(
            entries = bundle.entry.len(),
            deleted = bundle.deleted_count(),
            "History retrieved"
        );
        Ok(bundle)
    }

    /// Metadata of one instance, or of a type for a type-level identity
    pub async fn meta(&self, identity: &ResourceIdentity) -> Result<Meta> {
        self.meta_in(Scope::of(identity)).await
    }

    /// Profiles, tags and security labels used by resources of type `T`
    pub async fn type_meta<T: TypedResource>(&self) -> Result<Meta> {
        self.meta_in(Scope::Type(T::TYPE_NAME)).await
    }

    /// Profiles, tags and security labels used anywhere on the server
    pub async fn whole_system_meta(&self) -> Result<Meta> {
        self.meta_in(Scope::System).await
    }

    /// Add profiles, tags and security labels to a resource (`$meta-add`)
    ///
    /// Returns the resource's metadata after the change.
    pub async fn affix_meta(&self, identity: &ResourceIdentity, meta: &Meta) -> Result<Meta> {
        self.change_meta(identity, META_ADD_OPERATION, meta).await
    }

    /// Remove profiles, tags and security labels from a resource (`$meta-delete`)
    ///
    /// Returns the resource's metadata after the change.
    pub async fn delete_meta(&self, identity: &ResourceIdentity, meta: &Meta) -> Result<Meta> {
        self.change_meta(identity, META_DELETE_OPERATION, meta).await
    }

    async fn meta_in(&self, scope: Scope<'_>) -> Result<Meta> {
        let parameters: Parameters = self
            .execute(self.requests.meta(scope)?)
            .await?
            .require_resource()?;
        returned_meta(&parameters)
    }

    async fn change_meta(
        &self,
        identity: &ResourceIdentity,
        operation: &str,
        meta: &Meta,
    ) -> Result<Meta> {
        let identity = identity.without_version();
        let body = Parameters::with_meta(meta).to_json()?;
        let request = self.requests.meta_change(&identity, operation, body)?;
        let parameters: Parameters = self.execute(request).await?.require_resource()?;

        tracing::info!(identity = %identity, operation, "Changed resource metadata");
        returned_meta(&parameters)
    }

    /// Resource returned by a create or update
    ///
    /// Falls back to reading `Location` (or `fallback`) when the server
    /// answered without a body.
    async fn returned_resource<R: Resource>(
        &self,
        response: FhirResponse,
        fallback: Option<ResourceIdentity>,
    ) -> Result<R> {
        if let Some(resource) = response.resource()? {
            return Ok(resource);
        }

        let location = response.details.resource_location().or(fallback).ok_or_else(|| {
            FhirError::InvalidResponse(
                "server returned neither a resource nor a Location header".to_string(),
            )
        })?;

        tracing::debug!(location = %location, "Reading resource from Location");
        self.read(&location).await
    }

    /// Send a request, retrying idempotent ones on connection failure
    async fn execute(&self, request: FhirRequest) -> Result<FhirResponse> {
        let max_attempts = if request.is_idempotent() {
            self.config.retry.max_attempts.max(1)
        } else {
            1
        };
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send(&request).await {
                Ok(response) => return self.finish(&request, response),
                Err(e) if attempt < max_attempts && is_transient(&e) => {
                    let delay_ms = self.config.retry.delay_for_attempt(attempt);
                    log_retry_attempt!(attempt + 1, max_attempts, e);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    tracing::error!(
                        method = %request.method,
                        url = %request.url,
                        attempts = attempt,
                        error = %e,
                        "Request failed"
                    );
                    return Err(e.into());
                }
            }
        }
    }

    async fn send(&self, request: &FhirRequest) -> std::result::Result<FhirResponse, FhirError> {
        log_request!(request.method, request.url);
        let started = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(authorization) = &self.authorization {
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                authorization.expose_secret().as_str(),
            );
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                FhirError::InvalidResponse(format!("cannot serialize request body: {e}"))
            })?;
            builder = builder.body(bytes);
        }

        let resp = builder.send().await.map_err(transport_error)?;
        let details = ResponseDetails::from_headers(resp.status().as_u16(), resp.headers());
        let body = resp.text().await.map_err(transport_error)?;

        log_response!(request.method, request.url, details.status, started.elapsed());
        Ok(FhirResponse::new(details, body))
    }

    fn finish(&self, request: &FhirRequest, response: FhirResponse) -> Result<FhirResponse> {
        if let Ok(mut last) = self.last_response.write() {
            *last = Some(response.details.clone());
        }

        response.error_for_status().map_err(|e| {
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                status = e.status().unwrap_or_default(),
                error = %e,
                "Server reported failure"
            );
            e.into()
        })
    }
}

fn transport_error(e: reqwest::Error) -> FhirError {
    if e.is_timeout() {
        FhirError::Timeout(e.to_string())
    } else {
        FhirError::ConnectionFailed(e.to_string())
    }
}

fn is_transient(e: &FhirError) -> bool {
    matches!(e, FhirError::ConnectionFailed(_) | FhirError::Timeout(_))
}

fn outcome_of(response: &FhirResponse) -> Option<OperationOutcome> {
    response.resource::<OperationOutcome>().ok().flatten()
}

fn returned_meta(parameters: &Parameters) -> Result<Meta> {
    parameters
        .meta_value(META_RETURN_PARAMETER)
        .or_else(|| parameters.parameter.iter().find_map(|p| p.value_meta.as_ref()))
        .cloned()
        .ok_or_else(|| {
            FhirError::InvalidResponse("Parameters response has no meta value".to_string()).into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coding;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ServerConfig::new("ftp://fhir.example.org");
        assert!(matches!(
            FhirClient::new(config),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_new_missing_ca_certificate() {
        let mut config = ServerConfig::new("https://fhir.example.org");
        config.tls_ca_cert = Some("/nonexistent/ca.pem".to_string());
        assert!(FhirClient::new(config).is_err());
    }

    #[test]
    fn test_settings_toggles() {
        let mut client = FhirClient::from_url("http://localhost:8080/fhir/").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8080/fhir");
        assert_eq!(client.preferred_format(), ResourceFormat::Json);
        assert!(client.last_response().is_none());

        client.set_preferred_format(ResourceFormat::Xml);
        assert_eq!(client.preferred_format(), ResourceFormat::Xml);
    }

    #[test]
    fn test_returned_meta_prefers_return_parameter() {
        let mut parameters = Parameters::with_meta(&Meta::new().with_profile("http://a"));
        parameters.parameter[0].name = "return".to_string();
        let meta = returned_meta(&parameters).unwrap();
        assert!(meta.has_profile("http://a"));

        let other = Parameters::with_meta(&Meta::new().with_tag(Coding::new("urn:t", "x")));
        assert!(returned_meta(&other).unwrap().has_tag("urn:t", "x"));

        assert!(returned_meta(&Parameters::default()).is_err());
    }

    #[test]
    fn test_transient_errors() {
        assert!(is_transient(&FhirError::ConnectionFailed("refused".into())));
        assert!(is_transient(&FhirError::Timeout("slow".into())));
        assert!(!is_transient(&FhirError::InvalidResponse("bad".into())));
    }
}
