use thiserror::Error;

/// Result type for publisher operations.
pub type Result<T> = std::result::Result<T, PublisherError>;

/// Errors that can occur while publishing to the catalogue.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Token acquisition failed; no request was sent
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The catalogue answered with a non-OK status and a body.
    /// Displays the server's body verbatim.
    #[error("{0}")]
    RemoteRejection(String),

    /// No response body was available (any status), or the transport failed.
    /// Displays the reason phrase verbatim.
    #[error("{0}")]
    RemoteFailureNoBody(String),

    /// OK status, but the body was not a valid submission receipt
    #[error("Malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be encoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PublisherError {
    /// The diagnostic text carried by this error.
    ///
    /// For rejections this is the server's own message, untouched.
    pub fn detail(&self) -> String {
        match self {
            PublisherError::Authentication(detail)
            | PublisherError::RemoteRejection(detail)
            | PublisherError::RemoteFailureNoBody(detail)
            | PublisherError::Config(detail)
            | PublisherError::InvalidRequest(detail) => detail.clone(),
            PublisherError::MalformedResponse(e) => e.to_string(),
        }
    }
}
