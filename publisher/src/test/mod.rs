pub mod utils;

use crate::{CatalogueClient, PublisherError};
use utils::{create_test_config_with_urls, DATASET_ID, FILE_ID, ORGANISATION_ID};
use uuid::Uuid;
use wiremock::matchers::{body_bytes, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS_TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.test";
const METADATA: &str = r#"{"Title":"Street lighting","Licence":"OGL-UK-3.0"}"#;

/// Client whose identity provider and catalogue are both served by `server`
fn client_for(server: &MockServer) -> CatalogueClient {
    let config = create_test_config_with_urls(&format!("{}/", server.uri()), &server.uri());
    CatalogueClient::new(config).expect("Failed to create client")
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=secret-1"))
        .and(body_string_contains("resource=api%3A%2F%2Fcatalogue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "resource": "api://catalogue",
            "access_token": ACCESS_TOKEN
        })))
        .mount(server)
        .await;
}

fn dataset_path() -> String {
    format!("/Files/Organisation/{ORGANISATION_ID}/Dataset/{DATASET_ID}")
}

fn file_path() -> String {
    format!("{}/File/{FILE_ID}", dataset_path())
}

/// Full flow: token from the identity provider, JSON body to the dataset endpoint
#[test_log::test(tokio::test)]
async fn test_e2e_external_file() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(dataset_path()))
        .and(query_param("subscription-key", "sub-key-1"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(body_bytes(METADATA.as_bytes().to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "RequestId": "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request_id = client_for(&server)
        .submit_external_file(METADATA)
        .await
        .expect("submission should be accepted");

    assert_eq!(request_id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
}

#[test_log::test(tokio::test)]
async fn test_e2e_file_version_with_content() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(file_path()))
        .and(query_param("subscription-key", "sub-key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "RequestId": "7c9e6679-7425-40de-944b-e07fc1f90ae7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let content = "lamp_id,wattage\n1001,70\n1002,100\n";
    let request_id = client_for(&server)
        .submit_file_version(
            Uuid::parse_str(FILE_ID).unwrap(),
            METADATA,
            content,
            "lamps.csv",
        )
        .await
        .expect("submission should be accepted");

    assert_eq!(request_id.to_string(), "7c9e6679-7425-40de-944b-e07fc1f90ae7");

    let received = server.received_requests().await.unwrap();
    let upload = received
        .iter()
        .find(|r| r.url.path() == file_path())
        .expect("upload request");
    let body = String::from_utf8_lossy(&upload.body);

    let metadata_at = body.find(r#"name="metadata""#).expect("metadata part");
    let content_at = body
        .find(r#"name="content"; filename="lamps.csv""#)
        .expect("content part");
    assert!(metadata_at < content_at);
    assert!(body.contains(METADATA));
    assert!(body.contains(content));
    assert_eq!(body.matches("Content-Disposition: form-data").count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_e2e_server_errors_are_passed_up() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path(dataset_path()))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("Metadata failed validation: Title is required"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(dataset_path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.submit_external_file("{}").await.unwrap_err();
    assert!(matches!(err, PublisherError::RemoteRejection(_)));
    assert_eq!(err.to_string(), "Metadata failed validation: Title is required");

    let err = client.submit_external_file("{}").await.unwrap_err();
    assert!(matches!(err, PublisherError::RemoteFailureNoBody(_)));
    assert_eq!(err.to_string(), "Service Unavailable");
}

#[test_log::test(tokio::test)]
async fn test_e2e_rejected_credentials_skip_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "unauthorized_client",
            "error_description": "AADSTS700016: Application not found in the directory."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(dataset_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit_file(METADATA, "x", "x.txt")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Authentication failed: AADSTS700016: Application not found in the directory."
    );
}
