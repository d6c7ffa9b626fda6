//! Test utilities shared by the unit and wire-level tests
use crate::client::CatalogueClient;
use crate::config::ClientConfig;
use crate::http::MockHttpClient;
use crate::token::MockTokenProvider;
use url::Url;
use uuid::Uuid;

pub const ORGANISATION_ID: &str = "0e9b3b3e-6a4f-4f62-8d0c-3f9bde1c2a10";
pub const DATASET_ID: &str = "6f1c9a2d-1b4e-4c8e-9f3a-5d2e7b8c4a01";
pub const FILE_ID: &str = "b1946ac9-2492-4d5e-8e4c-5f2a3d0c7e11";

/// Config pointing at `https://login.example.com/tenant-1` and `https://api.example.com`
pub fn create_test_config() -> ClientConfig {
    create_test_config_with_urls("https://login.example.com/", "https://api.example.com")
}

pub fn create_test_config_with_urls(authority_base: &str, api_base_url: &str) -> ClientConfig {
    ClientConfig::new(
        authority_base,
        "tenant-1",
        "api://catalogue",
        "client-1",
        "secret-1",
        "sub-key-1",
        Uuid::parse_str(ORGANISATION_ID).expect("valid organisation id"),
        Uuid::parse_str(DATASET_ID).expect("valid dataset id"),
    )
    .with_api_base_url(Url::parse(api_base_url).expect("valid API base URL"))
}

/// A client over mock collaborators, returned alongside handles to those mocks
pub fn create_test_client() -> (
    CatalogueClient<MockHttpClient, MockTokenProvider>,
    MockHttpClient,
    MockTokenProvider,
) {
    let http = MockHttpClient::new();
    let tokens = MockTokenProvider::new();
    let client =
        CatalogueClient::with_components(create_test_config(), http.clone(), tokens.clone())
            .expect("Failed to create test client");
    (client, http, tokens)
}
