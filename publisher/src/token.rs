//! OAuth2 access token acquisition.
//!
//! The catalogue is protected by Azure AD using the client-credentials grant: the publisher
//! authenticates as itself (client id + secret) and asks for a token for the catalogue's
//! resource id. Tokens are never cached; every submission acquires its own.

use crate::error::{PublisherError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Trait for acquiring bearer tokens.
///
/// # Errors
/// Implementations report every failure (unreachable identity provider, rejected
/// credentials, unreadable response) as [`PublisherError::Authentication`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(
        &self,
        authority: &str,
        client_id: &str,
        client_secret: &str,
        resource: &str,
    ) -> Result<String>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Client-credentials token provider for Azure AD v1 endpoints.
#[derive(Clone)]
pub struct AzureAdTokenProvider {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl AzureAdTokenProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublisherError::Config(format!("Failed to build token client: {e}")))?;
        Ok(Self { client })
    }

    /// Token endpoint for an authority such as `https://login.microsoftonline.com/{tenant}`.
    pub fn token_endpoint(authority: &str) -> String {
        format!("{}/oauth2/token", authority.trim_end_matches('/'))
    }
}

#[async_trait]
impl TokenProvider for AzureAdTokenProvider {
    #[tracing::instrument(skip_all, fields(authority = %authority, client_id = %client_id))]
    async fn acquire_token(
        &self,
        authority: &str,
        client_id: &str,
        client_secret: &str,
        resource: &str,
    ) -> Result<String> {
        let endpoint = Self::token_endpoint(authority);

        tracing::debug!(endpoint = %endpoint, resource = %resource, "Requesting access token");

        let response = self
            .client
            .post(&endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("resource", resource),
            ])
            .send()
            .await
            .map_err(|e| {
                PublisherError::Authentication(format!("Token request to {endpoint} failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PublisherError::Authentication(format!("Failed to read token response: {e}"))
        })?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) if body.trim().is_empty() => status.to_string(),
                Err(_) => body,
            };
            return Err(PublisherError::Authentication(detail));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            PublisherError::Authentication(format!("Invalid token response: {e}"))
        })?;

        if token.access_token.is_empty() {
            return Err(PublisherError::Authentication(
                "Token response contained an empty access_token".to_string(),
            ));
        }

        tracing::debug!("Access token acquired");

        Ok(token.access_token)
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

/// Token handed out by [`MockTokenProvider`] when no response is queued.
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Mock token provider for testing.
///
/// Queued results are returned in FIFO order; once the queue is empty every call
/// succeeds with [`MOCK_ACCESS_TOKEN`].
#[derive(Clone, Default)]
pub struct MockTokenProvider {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<Mutex<Vec<TokenCall>>>,
}

/// Record of a call made to the mock token provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCall {
    pub authority: String,
    pub client_id: String,
    pub client_secret: String,
    pub resource: String,
}

impl MockTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose next acquisition fails with `detail`.
    pub fn failing(detail: &str) -> Self {
        let mock = Self::new();
        mock.add_response(Err(PublisherError::Authentication(detail.to_string())));
        mock
    }

    pub fn add_response(&self, response: Result<String>) {
        self.responses.lock().push_back(response);
    }

    pub fn get_calls(&self) -> Vec<TokenCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn acquire_token(
        &self,
        authority: &str,
        client_id: &str,
        client_secret: &str,
        resource: &str,
    ) -> Result<String> {
        self.calls.lock().push(TokenCall {
            authority: authority.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            resource: resource.to_string(),
        });

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(MOCK_ACCESS_TOKEN.to_string()))
    }
}
