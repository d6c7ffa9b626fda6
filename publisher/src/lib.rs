//! Publisher for an open-data catalogue API.
//!
//! This crate uploads file metadata, and optionally file content, to a catalogue dataset:
//! - Acquires an OAuth2 client-credentials token for every submission
//! - Targets the dataset endpoint for new files or the file endpoint for new versions
//! - Sends JSON metadata as the body, or JSON plus content as `multipart/form-data`
//! - Returns the request id the catalogue assigns, or the catalogue's own error text
//!
//! # Example
//! ```ignore
//! use publisher::{CatalogueClient, ClientConfig};
//!
//! let client = CatalogueClient::new(ClientConfig::new(
//!     "https://login.microsoftonline.com/",
//!     "contoso.onmicrosoft.com",
//!     "https://contoso.onmicrosoft.com/catalogue-api",
//!     client_id,
//!     client_secret,
//!     subscription_key,
//!     organisation_id,
//!     dataset_id,
//! ))?;
//!
//! // New file with content
//! let request_id = client.submit_file(metadata_json, csv_bytes, "lamps.csv").await?;
//!
//! // New version of an existing file, metadata only
//! let request_id = client.submit_external_file_version(file_id, metadata_json).await?;
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod telemetry;
pub mod token;

#[cfg(test)]
mod test;

// Re-export commonly used types
pub use client::{CatalogueClient, SubmissionReceipt};
pub use config::{Args, ClientConfig, Command};
pub use error::{PublisherError, Result};
pub use http::{
    HttpClient, HttpRequest, HttpResponse, MockHttpClient, ReqwestHttpClient, UploadBody,
};
pub use token::{AzureAdTokenProvider, MockTokenProvider, TokenProvider};
