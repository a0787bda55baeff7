//! Error types for Mural

use thiserror::Error;

/// Result type alias for Mural operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Mural
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the remote API. Carries the server's own
    /// error message when one was supplied, otherwise a generic
    /// status-code message.
    #[error("{0}")]
    Api(String),

    /// Response body did not match the expected candidates/parts shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
