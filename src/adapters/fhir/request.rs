//! Construction of REST interactions
//!
//! Everything here is pure: a [`RequestFactory`] turns an interaction into a
//! [`FhirRequest`] (method, URL, headers and body) without touching the
//! network, so URL layout and header negotiation can be tested directly.

use super::search::SearchParams;
use crate::config::{basic_authorization, bearer_authorization, SecretString, ServerConfig};
use crate::domain::format::JSON_CONTENT_TYPE;
use crate::domain::identity::join_path;
use crate::domain::{ClientError, FhirError, ResourceFormat, ResourceIdentity, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::Value;
use url::Url;

pub const HISTORY_OPERATION: &str = "_history";
pub const META_OPERATION: &str = "$meta";
pub const META_ADD_OPERATION: &str = "$meta-add";
pub const META_DELETE_OPERATION: &str = "$meta-delete";
pub const METADATA_PATH: &str = "metadata";

/// Level at which a history or `$meta` interaction applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// The whole server
    System,
    /// Every resource of one type
    Type(&'a str),
    /// One resource instance; any version part of the identity is ignored
    Instance(&'a ResourceIdentity),
}

impl<'a> Scope<'a> {
    /// Instance scope for identities with an id, type scope otherwise
    pub fn of(identity: &'a ResourceIdentity) -> Self {
        if identity.id().is_some() {
            Scope::Instance(identity)
        } else {
            Scope::Type(identity.resource_type())
        }
    }
}

/// An HTTP request ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct FhirRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl FhirRequest {
    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// First value of header `name`, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// GET, PUT and DELETE can be repeated safely after a connection failure
    pub fn is_idempotent(&self) -> bool {
        self.method == Method::GET || self.method == Method::PUT || self.method == Method::DELETE
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    fn with_query(mut self, pairs: &[(String, String)]) -> Self {
        if !pairs.is_empty() {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }
        self
    }
}

/// Negotiation settings shared by every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    pub format: ResourceFormat,
    pub use_format_param: bool,
    pub fhir_version: Option<String>,
    pub version_aware_update: bool,
    pub return_representation: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            format: ResourceFormat::Json,
            use_format_param: false,
            fhir_version: None,
            version_aware_update: false,
            return_representation: true,
        }
    }
}

impl From<&ServerConfig> for RequestSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            format: config.preferred_format,
            use_format_param: config.use_format_param,
            fhir_version: config.fhir_version.clone(),
            version_aware_update: config.version_aware_update,
            return_representation: config.return_representation,
        }
    }
}

/// Builds requests against one service base URL
#[derive(Debug, Clone)]
pub struct RequestFactory {
    endpoint: Url,
    settings: RequestSettings,
}

impl RequestFactory {
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidIdentity`] if `endpoint` is not an
    /// absolute http(s) URL.
    pub fn new(endpoint: &str, settings: RequestSettings) -> std::result::Result<Self, FhirError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            settings,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RequestSettings {
        &mut self.settings
    }

    /// `GET [base]/metadata`
    pub fn capabilities(&self) -> Result<FhirRequest> {
        self.get(self.path_url(METADATA_PATH)?)
    }

    /// `GET` of an instance, or of one version when the identity has one
    pub fn read(&self, identity: &ResourceIdentity) -> Result<FhirRequest> {
        require_id(identity, "read")?;
        self.get(identity.to_url(&self.endpoint)?)
    }

    /// `GET` of an arbitrary URL, typically a paging link
    pub fn get(&self, url: Url) -> Result<FhirRequest> {
        Ok(self.negotiate(FhirRequest::new(Method::GET, url)))
    }

    /// `POST [base]/Type`
    pub fn create(&self, resource_type: &str, body: Value) -> Result<FhirRequest> {
        let url = self.path_url(resource_type)?;
        Ok(self.write(FhirRequest::new(Method::POST, url), body))
    }

    /// `PUT [base]/Type/id`, with `If-Match` when version-aware updates are on
    pub fn update(
        &self,
        identity: &ResourceIdentity,
        body: Value,
        version_id: Option<&str>,
    ) -> Result<FhirRequest> {
        require_id(identity, "update")?;
        let url = identity.without_version().to_url(&self.endpoint)?;
        let request = self.write(FhirRequest::new(Method::PUT, url), body);
        Ok(self.if_match(request, version_id))
    }

    /// `PUT [base]/Type?criteria`
    pub fn update_conditional(
        &self,
        resource_type: &str,
        params: &SearchParams,
        body: Value,
    ) -> Result<FhirRequest> {
        require_criteria(params, "conditional update")?;
        let url = self.path_url(resource_type)?;
        let request = FhirRequest::new(Method::PUT, url).with_query(&params.to_pairs());
        Ok(self.write(request, body))
    }

    /// `DELETE [base]/Type/id`
    pub fn delete(
        &self,
        identity: &ResourceIdentity,
        version_id: Option<&str>,
    ) -> Result<FhirRequest> {
        require_id(identity, "delete")?;
        let url = identity.without_version().to_url(&self.endpoint)?;
        let request = self.negotiate(FhirRequest::new(Method::DELETE, url));
        Ok(self.if_match(request, version_id))
    }

    /// `DELETE [base]/Type?criteria`
    pub fn delete_conditional(
        &self,
        resource_type: &str,
        params: &SearchParams,
    ) -> Result<FhirRequest> {
        require_criteria(params, "conditional delete")?;
        let url = self.path_url(resource_type)?;
        let request = FhirRequest::new(Method::DELETE, url).with_query(&params.to_pairs());
        Ok(self.negotiate(request))
    }

    /// `GET [base]/Type?params`
    pub fn search(&self, resource_type: &str, params: &SearchParams) -> Result<FhirRequest> {
        let url = self.path_url(resource_type)?;
        self.get(url).map(|r| r.with_query(&params.to_pairs()))
    }

    /// `GET [base][/Type[/id]]/_history` with optional `_since` and `_count`
    pub fn history(
        &self,
        scope: Scope<'_>,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<FhirRequest> {
        let url = self.scoped_url(scope, HISTORY_OPERATION)?;
        let mut pairs = Vec::new();
        if let Some(since) = since {
            pairs.push((
                "_since".to_string(),
                since.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if let Some(count) = page_size {
            pairs.push(("_count".to_string(), count.to_string()));
        }
        self.get(url).map(|r| r.with_query(&pairs))
    }

    /// `GET [base][/Type[/id]]/$meta`
    pub fn meta(&self, scope: Scope<'_>) -> Result<FhirRequest> {
        self.get(self.scoped_url(scope, META_OPERATION)?)
    }

    /// `POST [base]/Type/id/$meta-add` or `$meta-delete` with a `Parameters` body
    pub fn meta_change(
        &self,
        identity: &ResourceIdentity,
        operation: &str,
        parameters: Value,
    ) -> Result<FhirRequest> {
        require_id(identity, operation)?;
        let url = self.scoped_url(Scope::Instance(identity), operation)?;
        Ok(self.write(FhirRequest::new(Method::POST, url), parameters))
    }

    /// Resolves a link returned by the server
    ///
    /// Relative links are taken relative to the endpoint, never to the host root.
    pub fn resolve_link(&self, link: &str) -> Result<Url> {
        let link = link.trim();
        if link.starts_with("http://") || link.starts_with("https://") {
            return Url::parse(link)
                .map_err(|e| FhirError::InvalidResponse(format!("invalid link '{link}': {e}")).into());
        }
        let (path, query) = match link.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (link, None),
        };
        let mut url = if path.is_empty() {
            self.endpoint.clone()
        } else {
            join_path(&self.endpoint, path)?
        };
        url.set_query(query);
        Ok(url)
    }

    fn path_url(&self, path: &str) -> Result<Url> {
        Ok(join_path(&self.endpoint, path)?)
    }

    fn scoped_url(&self, scope: Scope<'_>, operation: &str) -> Result<Url> {
        let path = match scope {
            Scope::System => operation.to_string(),
            Scope::Type(resource_type) => format!("{resource_type}/{operation}"),
            Scope::Instance(identity) => {
                require_id(identity, operation)?;
                format!(
                    "{}/{operation}",
                    identity.without_version().make_relative().relative_path()
                )
            }
        };
        match scope {
            Scope::Instance(identity) => {
                let base = identity.base().unwrap_or(&self.endpoint);
                Ok(join_path(base, &path)?)
            }
            _ => self.path_url(&path),
        }
    }

    /// Adds format negotiation: `Accept` or `_format`
    fn negotiate(&self, request: FhirRequest) -> FhirRequest {
        if self.settings.use_format_param {
            let already_set = request.url.query_pairs().any(|(name, _)| name == "_format");
            if already_set {
                return request;
            }
            let pair = (
                "_format".to_string(),
                self.settings.format.format_param().to_string(),
            );
            request.with_query(&[pair])
        } else {
            let accept = self.with_version(self.settings.format.content_type().to_string());
            request.with_header("Accept", accept)
        }
    }

    /// Adds a JSON body with its content headers
    fn write(&self, request: FhirRequest, body: Value) -> FhirRequest {
        let content_type = self.with_version(format!("{JSON_CONTENT_TYPE}; charset=utf-8"));
        let prefer = if self.settings.return_representation {
            "return=representation"
        } else {
            "return=minimal"
        };
        let mut request = self
            .negotiate(request)
            .with_header("Content-Type", content_type)
            .with_header("Prefer", prefer);
        request.body = Some(body);
        request
    }

    fn if_match(&self, request: FhirRequest, version_id: Option<&str>) -> FhirRequest {
        match version_id {
            Some(vid) if self.settings.version_aware_update => {
                request.with_header("If-Match", format!("W/\"{vid}\""))
            }
            _ => request,
        }
    }

    fn with_version(&self, mime: String) -> String {
        match &self.settings.fhir_version {
            Some(version) => format!("{mime}; fhirVersion={version}"),
            None => mime,
        }
    }
}

/// `Authorization` header value for the configured scheme
///
/// # Errors
///
/// Returns [`ClientError::Authentication`] when the credentials the scheme
/// needs are missing.
pub fn authorization_header(config: &ServerConfig) -> Result<Option<SecretString>> {
    match config.auth_type.as_str() {
        "none" => Ok(None),
        "basic" => {
            let username = config.username.as_deref().ok_or_else(|| {
                ClientError::Authentication("basic authentication needs a username".to_string())
            })?;
            let password = config.password.as_ref().ok_or_else(|| {
                ClientError::Authentication("basic authentication needs a password".to_string())
            })?;
            Ok(Some(basic_authorization(username, password)))
        }
        "bearer" => {
            let token = config.token.as_ref().ok_or_else(|| {
                ClientError::Authentication("bearer authentication needs a token".to_string())
            })?;
            Ok(Some(bearer_authorization(token)))
        }
        other => Err(ClientError::Authentication(format!(
            "unsupported auth_type '{other}'"
        ))),
    }
}

fn parse_endpoint(endpoint: &str) -> std::result::Result<Url, FhirError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| {
        FhirError::InvalidIdentity(format!("endpoint '{endpoint}' is not a valid URL: {e}"))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(FhirError::InvalidIdentity(format!(
            "endpoint '{endpoint}' must use http or https"
        )));
    }
    Ok(url)
}

fn require_id(identity: &ResourceIdentity, interaction: &str) -> Result<()> {
    if identity.id().is_none() {
        return Err(FhirError::InvalidIdentity(format!(
            "{interaction} needs an identity with an id, got '{identity}'"
        ))
        .into());
    }
    Ok(())
}

fn require_criteria(params: &SearchParams, interaction: &str) -> Result<()> {
    if !params.has_filters() {
        return Err(FhirError::InvalidSearch(format!(
            "{interaction} needs at least one search filter besides _include, _sort and _count"
        ))
        .into());
    }
    Ok(())
}
