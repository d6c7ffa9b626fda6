//! HTTP transport abstraction for catalogue submissions.
//!
//! This module defines the `HttpClient` trait to abstract the single POST a submission
//! makes, enabling testability with mock implementations.

use crate::error::{PublisherError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use hyper::ext::ReasonPhrase;
use parking_lot::Mutex;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Multipart field carrying the JSON metadata.
///
/// The catalogue accepts an unnamed `form-data` part here; reqwest names every part, so
/// this name is sent on the wire as well.
pub const METADATA_FIELD: &str = "metadata";
/// Multipart field carrying the file content.
pub const CONTENT_FIELD: &str = "content";

/// Body of a submission: metadata alone, or metadata followed by file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBody {
    /// Sent as the raw POST body
    Json(Bytes),
    /// Sent as `multipart/form-data`, metadata part first
    JsonWithContent {
        json: Bytes,
        content: Bytes,
        filename: String,
    },
}

impl UploadBody {
    pub fn json(&self) -> &Bytes {
        match self {
            UploadBody::Json(json) | UploadBody::JsonWithContent { json, .. } => json,
        }
    }
}

/// A fully resolved submission request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub bearer_token: String,
    pub body: UploadBody,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("bearer_token", &"<redacted>")
            .field("body", &self.body)
            .finish()
    }
}

/// Response from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase as sent by the server, or the canonical one when it sent none
    pub reason: String,
    /// Response body; `None` when the server sent nothing
    pub body: Option<String>,
}

/// Trait for executing submission POSTs.
///
/// # Errors
/// Transport-level failures (connection refused, timeout, TLS) are reported as
/// [`PublisherError::RemoteFailureNoBody`]. Any HTTP status, including errors, is a
/// successful `HttpResponse`.
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublisherError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn multipart_form(json: Bytes, content: Bytes, filename: String) -> Result<Form> {
    let metadata = Part::bytes(json.to_vec())
        .mime_str("application/json; charset=utf-8")
        .map_err(|e| PublisherError::InvalidRequest(format!("Invalid metadata part: {e}")))?;
    let content = Part::bytes(content.to_vec()).file_name(filename);

    Ok(Form::new()
        .part(METADATA_FIELD, metadata)
        .part(CONTENT_FIELD, content))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[tracing::instrument(skip(self, request), fields(url = %request.url.path()))]
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            url,
            bearer_token,
            body,
        } = request;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {bearer_token}"))
            .map_err(|_| {
                PublisherError::InvalidRequest(
                    "Access token is not a valid header value".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        let mut req = self.client.post(url).header(AUTHORIZATION, authorization);

        req = match body {
            UploadBody::Json(json) => {
                tracing::trace!(body_len = json.len(), "Sending JSON body");
                req.header(CONTENT_TYPE, "application/json").body(json)
            }
            UploadBody::JsonWithContent {
                json,
                content,
                filename,
            } => {
                tracing::trace!(
                    body_len = json.len(),
                    content_len = content.len(),
                    filename = %filename,
                    "Sending multipart body"
                );
                req.multipart(multipart_form(json, content, filename)?)
            }
        };

        let response = req.send().await.map_err(|e| {
            tracing::debug!(error = %e, "HTTP request failed");
            PublisherError::RemoteFailureNoBody(e.to_string())
        })?;

        let status = response.status();
        let reason = match response.extensions().get::<ReasonPhrase>() {
            Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
            None => status.canonical_reason().unwrap_or_default().to_string(),
        };
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PublisherError::RemoteFailureNoBody(e.to_string()))?;
        let body = (!bytes.is_empty()).then(|| String::from_utf8_lossy(&bytes).into_owned());

        tracing::debug!(
            status = status.as_u16(),
            response_len = bytes.len(),
            "HTTP request completed"
        );

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

/// Mock HTTP client for testing.
///
/// Responses are returned in FIFO order; every call is recorded regardless of outcome.
///
/// # Example
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.add_response(Ok(HttpResponse {
///     status: 200,
///     reason: "OK".to_string(),
///     body: Some(r#"{"RequestId":"3fa85f64-5717-4562-b3fc-2c963f66afa6"}"#.to_string()),
/// }));
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a call made to the mock HTTP client.
pub type MockCall = HttpRequest;

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, response: Result<HttpResponse>) {
        self.responses.lock().push_back(response);
    }

    /// Queue an OK response carrying `body`.
    pub fn add_ok(&self, body: &str) {
        self.add_response(Ok(HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            body: Some(body.to_string()),
        }));
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = request.url.path().to_string();
        self.calls.lock().push(request);

        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(PublisherError::InvalidRequest(format!(
                "No mock response configured for POST {path}"
            )))
        })
    }
}
