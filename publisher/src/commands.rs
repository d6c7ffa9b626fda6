//! Execution of the publishing commands exposed by the CLI.

use anyhow::Context;
use bytes::Bytes;
use std::path::Path;
use uuid::Uuid;

use crate::client::CatalogueClient;
use crate::config::Command;
use crate::http::HttpClient;
use crate::token::TokenProvider;

/// Read the command's inputs from disk and submit them, returning the request id.
pub async fn run<H: HttpClient, T: TokenProvider>(
    client: &CatalogueClient<H, T>,
    command: Command,
) -> anyhow::Result<Uuid> {
    let request_id = match command {
        Command::AddExternalFile { metadata } => {
            let metadata = read(&metadata).await?;
            client.submit_external_file(metadata).await?
        }
        Command::AddFile {
            metadata,
            content,
            filename,
        } => {
            let filename = resolve_filename(filename, &content)?;
            let metadata = read(&metadata).await?;
            let content = read(&content).await?;
            client.submit_file(metadata, content, filename).await?
        }
        Command::AddExternalFileVersion { file_id, metadata } => {
            let metadata = read(&metadata).await?;
            client.submit_external_file_version(file_id, metadata).await?
        }
        Command::AddFileVersion {
            file_id,
            metadata,
            content,
            filename,
        } => {
            let filename = resolve_filename(filename, &content)?;
            let metadata = read(&metadata).await?;
            let content = read(&content).await?;
            client
                .submit_file_version(file_id, metadata, content, filename)
                .await?
        }
    };

    Ok(request_id)
}

async fn read(path: &Path) -> anyhow::Result<Bytes> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), len = bytes.len(), "Read input file");
    Ok(Bytes::from(bytes))
}

/// Explicit filename, else the content path's final component.
fn resolve_filename(filename: Option<String>, content: &Path) -> anyhow::Result<String> {
    if let Some(filename) = filename {
        return Ok(filename);
    }
    content
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| {
            format!(
                "Cannot derive a filename from {}; pass --filename",
                content.display()
            )
        })
}
