//! Integration tests for the blocking FHIR client

use fhir_rest_client::adapters::fhir::{BlockingFhirClient, SearchParams};
use fhir_rest_client::domain::{DynamicResource, Organization, Resource, ResourceIdentity};
use mockito::{Matcher, Server};
use serde_json::json;

const FHIR_JSON: &str = "application/fhir+json";

#[test]
fn test_blocking_read_and_search() {
    let mut server = Server::new();
    let read = server
        .mock("GET", "/fhir/Organization/o1")
        .with_status(200)
        .with_header("content-type", FHIR_JSON)
        .with_header("etag", "W/\"7\"")
        .with_body(json!({"resourceType": "Organization", "id": "o1", "name": "ACME"}).to_string())
        .create();
    let search = server
        .mock("GET", "/fhir/Organization")
        .match_query(Matcher::UrlEncoded("name".into(), "ACME".into()))
        .with_status(200)
        .with_header("content-type", FHIR_JSON)
        .with_body(
            json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "total": 1,
                "entry": [{"resource": {"resourceType": "Organization", "id": "o1", "name": "ACME"}}]
            })
            .to_string(),
        )
        .create();

    let client = BlockingFhirClient::from_url(&format!("{}/fhir", server.url())).unwrap();

    let identity = ResourceIdentity::parse("Organization/o1").unwrap();
    let organization: Organization = client.read(&identity).unwrap();
    assert_eq!(organization.name.as_deref(), Some("ACME"));
    assert_eq!(organization.version_id(), Some("7"));

    let bundle = client
        .search::<Organization>(&SearchParams::new().criterion("name", "ACME"))
        .unwrap();
    assert_eq!(bundle.total, Some(1));
    assert_eq!(client.last_response().unwrap().status, 200);

    read.assert();
    search.assert();
}

#[test]
fn test_blocking_create_dynamic_resource() {
    let mut server = Server::new();
    let create = server
        .mock("POST", "/fhir/Observation")
        .match_body(Matcher::PartialJson(json!({
            "resourceType": "Observation",
            "status": "final"
        })))
        .with_status(201)
        .with_header("content-type", FHIR_JSON)
        .with_header("location", "Observation/obs-1/_history/1")
        .with_body(
            json!({
                "resourceType": "Observation",
                "id": "obs-1",
                "meta": {"versionId": "1"},
                "status": "final"
            })
            .to_string(),
        )
        .create();

    let client = BlockingFhirClient::from_url(&format!("{}/fhir", server.url())).unwrap();

    let observation = DynamicResource::new("Observation").with_field("status", json!("final"));
    let created = client.create(&observation).unwrap();

    create.assert();
    assert_eq!(created.id.as_deref(), Some("obs-1"));
    assert_eq!(created.version_id(), Some("1"));
}

#[test]
fn test_blocking_delete_returns_outcome() {
    let mut server = Server::new();
    let delete = server
        .mock("DELETE", "/fhir/Organization/o1")
        .with_status(200)
        .with_header("content-type", FHIR_JSON)
        .with_body(
            json!({
                "resourceType": "OperationOutcome",
                "issue": [{"severity": "information", "code": "informational", "diagnostics": "Deleted 1 resource"}]
            })
            .to_string(),
        )
        .create();

    let client = BlockingFhirClient::from_url(&format!("{}/fhir", server.url())).unwrap();
    let identity = ResourceIdentity::parse("Organization/o1").unwrap();
    let outcome = client.delete(&identity).unwrap().unwrap();

    delete.assert();
    assert!(!outcome.has_errors());
    assert_eq!(
        outcome.issue[0].diagnostics.as_deref(),
        Some("Deleted 1 resource")
    );
}
