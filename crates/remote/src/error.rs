//! Error types for the remote collection client.

use thiserror::Error;

use caddy_core::errors::RemoteStoreError;

/// Result type alias for remote client operations.
pub type Result<T> = std::result::Result<T, RemoteApiError>;

/// Errors that can occur while talking to the collection backend.
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad header value, malformed configuration, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl RemoteApiError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<RemoteApiError> for RemoteStoreError {
    fn from(err: RemoteApiError) -> Self {
        match err {
            RemoteApiError::Http(inner) => RemoteStoreError::Transport(inner.to_string()),
            RemoteApiError::Json(inner) => RemoteStoreError::Decode(inner.to_string()),
            RemoteApiError::Api { status, message } => RemoteStoreError::Api { status, message },
            RemoteApiError::InvalidRequest(message) => RemoteStoreError::Transport(message),
            RemoteApiError::Auth(message) => RemoteStoreError::Api {
                status: 401,
                message,
            },
        }
    }
}
