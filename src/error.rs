//! Error handling for the TORUM client

use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the TORUM client
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with a non-success status
    #[error("HTTP error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Http {
        /// HTTP status code
        status: u16,
        /// The `detail` field of the error body, or its raw text
        detail: Option<String>,
    },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response whose body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// JSON serialization errors on the request side
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Persisted session storage could not be written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The operation needs a logged-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The current user's role does not allow the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before anything was sent
    #[error("{0}")]
    Validation(String),
}

impl Error {
    /// Create a new HTTP error
    pub fn http(status: u16, detail: Option<String>) -> Self {
        Error::Http { status, detail }
    }

    /// Create a new malformed-response error
    pub fn malformed<T: fmt::Display>(msg: T) -> Self {
        Error::Malformed(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new forbidden error
    pub fn forbidden<T: fmt::Display>(msg: T) -> Self {
        Error::Forbidden(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// HTTP status of the failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text suitable for showing to the user
    ///
    /// Prefers the server's `detail` message and falls back to the error's
    /// own description.
    pub fn detail(&self) -> String {
        match self {
            Error::Http {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}
