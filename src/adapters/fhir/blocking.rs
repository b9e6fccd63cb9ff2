//! Synchronous wrapper around [`FhirClient`]
//!
//! Each call drives the async client to completion on a current-thread
//! runtime owned by the wrapper. Do not use it from inside an async context.

use super::client::FhirClient;
use super::response::ResponseDetails;
use super::search::SearchParams;
use crate::config::ServerConfig;
use crate::domain::{
    Bundle, CapabilityStatement, ClientError, DynamicResource, Meta, OperationOutcome,
    PageDirection, Resource, ResourceFormat, ResourceIdentity, Result, TypedResource,
};
use chrono::{DateTime, Utc};
use tokio::runtime::{Builder, Runtime};
use url::Url;

/// Blocking FHIR client with the same operations as [`FhirClient`]
///
/// # Example
///
/// ```no_run
/// use fhir_rest_client::adapters::fhir::BlockingFhirClient;
/// use fhir_rest_client::domain::{Patient, ResourceIdentity};
///
/// # fn example() -> fhir_rest_client::domain::Result<()> {
/// let client = BlockingFhirClient::from_url("http://localhost:8080/fhir")?;
/// let patient: Patient = client.read(&ResourceIdentity::parse("Patient/1")?)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BlockingFhirClient {
    runtime: Runtime,
    inner: FhirClient,
}

impl BlockingFhirClient {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Other(format!("Failed to start runtime: {e}")))?;
        let inner = FhirClient::new(config)?;
        Ok(Self { runtime, inner })
    }

    pub fn from_url(base_url: &str) -> Result<Self> {
        Self::new(ServerConfig::new(base_url))
    }

    /// The wrapped async client
    pub fn inner(&self) -> &FhirClient {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut FhirClient {
        &mut self.inner
    }

    pub fn endpoint(&self) -> &Url {
        self.inner.endpoint()
    }

    pub fn preferred_format(&self) -> ResourceFormat {
        self.inner.preferred_format()
    }

    pub fn last_response(&self) -> Option<ResponseDetails> {
        self.inner.last_response()
    }

    pub fn capabilities(&self) -> Result<CapabilityStatement> {
        self.runtime.block_on(self.inner.capabilities())
    }

    pub fn read<R: Resource>(&self, identity: &ResourceIdentity) -> Result<R> {
        self.runtime.block_on(self.inner.read(identity))
    }

    pub fn read_dynamic(&self, identity: &ResourceIdentity) -> Result<DynamicResource> {
        self.runtime.block_on(self.inner.read_dynamic(identity))
    }

    pub fn create<R: Resource>(&self, resource: &R) -> Result<R> {
        self.runtime.block_on(self.inner.create(resource))
    }

    pub fn update<R: Resource>(&self, resource: &R) -> Result<R> {
        self.runtime.block_on(self.inner.update(resource))
    }

    pub fn update_conditional<R: Resource>(
        &self,
        resource: &R,
        criteria: &SearchParams,
    ) -> Result<R> {
        self.runtime
            .block_on(self.inner.update_conditional(resource, criteria))
    }

    pub fn delete(&self, identity: &ResourceIdentity) -> Result<Option<OperationOutcome>> {
        self.runtime.block_on(self.inner.delete(identity))
    }

    pub fn delete_resource<R: Resource>(&self, resource: &R) -> Result<Option<OperationOutcome>> {
        self.runtime.block_on(self.inner.delete_resource(resource))
    }

    pub fn delete_conditional<T: TypedResource>(
        &self,
        criteria: &SearchParams,
    ) -> Result<Option<OperationOutcome>> {
        self.runtime
            .block_on(self.inner.delete_conditional::<T>(criteria))
    }

    pub fn search<T: TypedResource>(&self, params: &SearchParams) -> Result<Bundle> {
        self.runtime.block_on(self.inner.search::<T>(params))
    }

    pub fn search_type(&self, resource_type: &str, params: &SearchParams) -> Result<Bundle> {
        self.runtime
            .block_on(self.inner.search_type(resource_type, params))
    }

    pub fn search_by_id<T: TypedResource>(&self, id: &str, includes: &[&str]) -> Result<Bundle> {
        self.runtime
            .block_on(self.inner.search_by_id::<T>(id, includes))
    }

    pub fn continue_bundle(
        &self,
        bundle: &Bundle,
        direction: PageDirection,
    ) -> Result<Option<Bundle>> {
        self.runtime
            .block_on(self.inner.continue_bundle(bundle, direction))
    }

    pub fn history(
        &self,
        identity: &ResourceIdentity,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.runtime
            .block_on(self.inner.history(identity, since, page_size))
    }

    pub fn type_history<T: TypedResource>(
        &self,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.runtime
            .block_on(self.inner.type_history::<T>(since, page_size))
    }

    pub fn whole_system_history(
        &self,
        since: Option<DateTime<Utc>>,
        page_size: Option<u32>,
    ) -> Result<Bundle> {
        self.runtime
            .block_on(self.inner.whole_system_history(since, page_size))
    }

    pub fn meta(&self, identity: &ResourceIdentity) -> Result<Meta> {
        self.runtime.block_on(self.inner.meta(identity))
    }

    pub fn type_meta<T: TypedResource>(&self) -> Result<Meta> {
        self.runtime.block_on(self.inner.type_meta::<T>())
    }

    pub fn whole_system_meta(&self) -> Result<Meta> {
        self.runtime.block_on(self.inner.whole_system_meta())
    }

    pub fn affix_meta(&self, identity: &ResourceIdentity, meta: &Meta) -> Result<Meta> {
        self.runtime.block_on(self.inner.affix_meta(identity, meta))
    }

    pub fn delete_meta(&self, identity: &ResourceIdentity, meta: &Meta) -> Result<Meta> {
        self.runtime.block_on(self.inner.delete_meta(identity, meta))
    }
}
