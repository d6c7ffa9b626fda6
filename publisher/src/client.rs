//! Catalogue submission client.
//!
//! Every public operation is one token acquisition followed by one POST:
//!
//! | operation | endpoint | body |
//! |---|---|---|
//! | [`submit_external_file`](CatalogueClient::submit_external_file) | `.../Dataset/{dataset}` | JSON |
//! | [`submit_file`](CatalogueClient::submit_file) | `.../Dataset/{dataset}` | multipart |
//! | [`submit_external_file_version`](CatalogueClient::submit_external_file_version) | `.../Dataset/{dataset}/File/{file}` | JSON |
//! | [`submit_file_version`](CatalogueClient::submit_file_version) | `.../Dataset/{dataset}/File/{file}` | multipart |
//!
//! Submissions are not idempotent: each accepted call creates a new file or version record
//! and gets its own request id.

use crate::config::ClientConfig;
use crate::error::{PublisherError, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient, UploadBody};
use crate::token::{AzureAdTokenProvider, TokenProvider};
use bytes::Bytes;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

const STATUS_OK: u16 = 200;

/// Body of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmissionReceipt {
    pub request_id: Uuid,
}

/// Client for one organisation's dataset in the catalogue.
pub struct CatalogueClient<H = ReqwestHttpClient, T = AzureAdTokenProvider> {
    config: ClientConfig,
    http: H,
    tokens: T,
}

impl CatalogueClient {
    /// Create a client talking to Azure AD and the catalogue over reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = ReqwestHttpClient::new(config.request_timeout())?;
        let tokens = AzureAdTokenProvider::new(config.request_timeout())?;
        Self::with_components(config, http, tokens)
    }
}

impl<H: HttpClient, T: TokenProvider> CatalogueClient<H, T> {
    pub fn with_components(config: ClientConfig, http: H, tokens: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register a new file described only by its metadata.
    pub async fn submit_external_file(&self, metadata: impl Into<Bytes>) -> Result<Uuid> {
        self.submit(None, UploadBody::Json(metadata.into())).await
    }

    /// Upload a new file: metadata plus content.
    pub async fn submit_file(
        &self,
        metadata: impl Into<Bytes>,
        content: impl Into<Bytes>,
        filename: impl Into<String>,
    ) -> Result<Uuid> {
        let body = UploadBody::JsonWithContent {
            json: metadata.into(),
            content: content.into(),
            filename: filename.into(),
        };
        self.submit(None, body).await
    }

    /// Add a version to an existing file, metadata only.
    pub async fn submit_external_file_version(
        &self,
        file_id: Uuid,
        metadata: impl Into<Bytes>,
    ) -> Result<Uuid> {
        self.submit(Some(file_id), UploadBody::Json(metadata.into())).await
    }

    /// Add a version to an existing file: metadata plus content.
    pub async fn submit_file_version(
        &self,
        file_id: Uuid,
        metadata: impl Into<Bytes>,
        content: impl Into<Bytes>,
        filename: impl Into<String>,
    ) -> Result<Uuid> {
        let body = UploadBody::JsonWithContent {
            json: metadata.into(),
            content: content.into(),
            filename: filename.into(),
        };
        self.submit(Some(file_id), body).await
    }

    /// Submit `body` as a new file, or as a new version of `file_id`.
    ///
    /// Acquires a fresh token, posts once, and returns the request id the catalogue
    /// assigned. Nothing is retried.
    #[tracing::instrument(
        skip_all,
        fields(
            organisation_id = %self.config.organisation_id(),
            dataset_id = %self.config.dataset_id(),
            file_id = ?file_id,
        )
    )]
    pub async fn submit(&self, file_id: Option<Uuid>, body: UploadBody) -> Result<Uuid> {
        let bearer_token = self
            .tokens
            .acquire_token(
                &self.config.authority(),
                self.config.client_id(),
                self.config.client_secret(),
                self.config.resource_id(),
            )
            .await?;

        let url = self.endpoint_url(file_id)?;
        tracing::debug!(path = %url.path(), "Posting submission");

        let response = self
            .http
            .post(HttpRequest {
                url,
                bearer_token,
                body,
            })
            .await?;

        let request_id = parse_response(response)?;
        tracing::info!(request_id = %request_id, "Submission accepted");

        Ok(request_id)
    }

    /// Endpoint for a new file (`file_id` is `None`) or a new version of `file_id`,
    /// carrying the subscription key.
    pub fn endpoint_url(&self, file_id: Option<Uuid>) -> Result<Url> {
        let mut url = self.config.api_base_url().clone();
        let organisation_id = self.config.organisation_id().to_string();
        let dataset_id = self.config.dataset_id().to_string();

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PublisherError::Config(format!(
                    "api_base_url '{}' cannot be used as a base URL",
                    self.config.api_base_url()
                ))
            })?;
            segments
                .pop_if_empty()
                .push("Files")
                .push("Organisation")
                .push(&organisation_id)
                .push("Dataset")
                .push(&dataset_id);
            if let Some(file_id) = file_id {
                segments.push("File").push(&file_id.to_string());
            }
        }

        url.query_pairs_mut()
            .clear()
            .append_pair("subscription-key", self.config.subscription_key());

        Ok(url)
    }
}

/// Map a catalogue response to a request id.
///
/// A missing body fails with the reason phrase whatever the status; otherwise only
/// `200 OK` is a success and any other status fails with the body as sent.
fn parse_response(response: HttpResponse) -> Result<Uuid> {
    let Some(body) = response.body else {
        return Err(PublisherError::RemoteFailureNoBody(response.reason));
    };

    if response.status != STATUS_OK {
        return Err(PublisherError::RemoteRejection(body));
    }

    let receipt: SubmissionReceipt =
        serde_json::from_str(&body).map_err(PublisherError::MalformedResponse)?;
    Ok(receipt.request_id)
}
