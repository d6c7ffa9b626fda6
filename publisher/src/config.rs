//! Publisher configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `publisher.yaml` but can be specified via the `-f` flag or the `PUBLISHER_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `publisher.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PUBLISHER_` override YAML values
//!
//! Every credential and identifier is required; only `api_base_url` and `request_timeout`
//! have defaults.
//!
//! ## Example
//!
//! ```yaml
//! authority_base: "https://login.microsoftonline.com/"
//! tenant_id: "contoso.onmicrosoft.com"
//! resource_id: "https://contoso.onmicrosoft.com/catalogue-api"
//! client_id: "8c0b0d2e-5b7e-4d6f-9a0e-0d7f3b2a9c11"
//! client_secret: "..."
//! subscription_key: "..."
//! organisation_id: "0e9b3b3e-6a4f-4f62-8d0c-3f9bde1c2a10"
//! dataset_id: "6f1c9a2d-1b4e-4c8e-9f3a-5d2e7b8c4a01"
//! request_timeout: 30s
//! ```
//!
//! ```bash
//! # Keep secrets out of the file
//! PUBLISHER_CLIENT_SECRET=...
//! PUBLISHER_SUBSCRIPTION_KEY=...
//! ```

use clap::{Parser, Subcommand};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};
use url::Url;
use uuid::Uuid;

use crate::error::{PublisherError, Result};

/// Catalogue API the publisher talks to unless configured otherwise.
pub const DEFAULT_API_BASE_URL: &str = "https://api.open.glasgow.gov.uk";

/// CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(
        short = 'f',
        long,
        env = "PUBLISHER_CONFIG",
        default_value = "publisher.yaml"
    )]
    pub config: String,

    /// Validate configuration and exit without publishing anything.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// True when there is nothing to do: no subcommand and no `--validate`.
    ///
    /// Checked before the configuration file is read, so a bare invocation prints usage.
    pub fn needs_help(&self) -> bool {
        self.command.is_none() && !self.validate
    }
}

/// Publishing operations exposed on the command line.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a new file whose content lives elsewhere (metadata only)
    AddExternalFile {
        /// JSON metadata file
        #[arg(long)]
        metadata: PathBuf,
    },
    /// Upload a new file with its content
    AddFile {
        /// JSON metadata file
        #[arg(long)]
        metadata: PathBuf,
        /// File content to upload
        #[arg(long)]
        content: PathBuf,
        /// Filename sent with the content (defaults to the content file's name)
        #[arg(long)]
        filename: Option<String>,
    },
    /// Add a new version of an existing external file (metadata only)
    AddExternalFileVersion {
        /// Identifier of the existing file
        #[arg(long)]
        file_id: Uuid,
        /// JSON metadata file
        #[arg(long)]
        metadata: PathBuf,
    },
    /// Upload a new version of an existing file with its content
    AddFileVersion {
        /// Identifier of the existing file
        #[arg(long)]
        file_id: Uuid,
        /// JSON metadata file
        #[arg(long)]
        metadata: PathBuf,
        /// File content to upload
        #[arg(long)]
        content: PathBuf,
        /// Filename sent with the content (defaults to the content file's name)
        #[arg(long)]
        filename: Option<String>,
    },
}

/// Connection settings for a single organisation's dataset.
///
/// Immutable once constructed: the client only ever reads it.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Identity provider base, e.g. `https://login.microsoftonline.com/`.
    /// The tenant id is appended verbatim to form the authority.
    authority_base: String,
    tenant_id: String,
    /// Audience the access token is requested for
    resource_id: String,
    client_id: String,
    client_secret: String,
    /// API gateway key, sent as the `subscription-key` query parameter
    subscription_key: String,
    organisation_id: Uuid,
    dataset_id: Uuid,
    #[serde(default = "default_api_base_url")]
    api_base_url: Url,
    /// Deadline for each network call
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    request_timeout: Duration,
}

fn default_api_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl ClientConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authority_base: impl Into<String>,
        tenant_id: impl Into<String>,
        resource_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_key: impl Into<String>,
        organisation_id: Uuid,
        dataset_id: Uuid,
    ) -> Self {
        Self {
            authority_base: authority_base.into(),
            tenant_id: tenant_id.into(),
            resource_id: resource_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_key: subscription_key.into(),
            organisation_id,
            dataset_id,
            api_base_url: default_api_base_url(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Point the client at a different catalogue deployment.
    pub fn with_api_base_url(mut self, api_base_url: Url) -> Self {
        self.api_base_url = api_base_url;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> std::result::Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config
            .validate()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // PUBLISHER_CONFIG names the file itself and is not a setting
            .merge(Env::prefixed("PUBLISHER_").ignore(&["config"]))
    }

    /// Validate the configuration for required fields and usable URLs
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("authority_base", &self.authority_base),
            ("tenant_id", &self.tenant_id),
            ("resource_id", &self.resource_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("subscription_key", &self.subscription_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PublisherError::Config(format!("{name} must not be empty")));
            }
        }

        let authority = Url::parse(&self.authority()).map_err(|e| {
            PublisherError::Config(format!("authority '{}' is not a URL: {e}", self.authority()))
        })?;
        check_http_base("authority", &authority)?;
        check_http_base("api_base_url", &self.api_base_url)?;

        if self.request_timeout.is_zero() {
            return Err(PublisherError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Token authority: the authority base with the tenant id appended.
    pub fn authority(&self) -> String {
        format!("{}{}", self.authority_base, self.tenant_id)
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn subscription_key(&self) -> &str {
        &self.subscription_key
    }

    pub fn organisation_id(&self) -> Uuid {
        self.organisation_id
    }

    pub fn dataset_id(&self) -> Uuid {
        self.dataset_id
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn check_http_base(name: &str, url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PublisherError::Config(format!(
            "{name} must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(PublisherError::Config(format!(
            "{name} '{url}' cannot be used as a base URL"
        )));
    }
    Ok(())
}

// Secrets stay out of logs and panic messages
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("authority_base", &self.authority_base)
            .field("tenant_id", &self.tenant_id)
            .field("resource_id", &self.resource_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_key", &"<redacted>")
            .field("organisation_id", &self.organisation_id)
            .field("dataset_id", &self.dataset_id)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
