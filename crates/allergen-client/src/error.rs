//! Error types for backend access.

use thiserror::Error;

/// Errors that can occur while talking to the allergen store or the scanning service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, refused, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{endpoint} returned status {status}: {detail}")]
    Api {
        /// Endpoint path, e.g. `/scan`
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Human-readable message from the body's `detail` field
        detail: String,
    },

    /// The backend answered with a body we could not understand
    #[error("failed to parse response from {endpoint}: {message}")]
    Parse {
        /// Endpoint path
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Client-side failure before any request was sent
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether the backend could not be reached at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The backend's own message for a rejected request.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
