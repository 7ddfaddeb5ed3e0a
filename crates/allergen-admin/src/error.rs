use allergen_client::ClientError;
use thiserror::Error;

/// Error types for admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// A write was attempted while the backend is not connected.
    #[error("Backend offline")]
    Offline,

    /// The form is incomplete.
    #[error("{0}")]
    Validation(String),

    /// The store refused the request or could not be reached.
    #[error("{message}")]
    Client {
        /// Message shown to the operator
        message: String,
        /// Underlying client error
        #[source]
        source: ClientError,
    },
}

impl AdminError {
    /// Wrap a store failure, preferring the backend's own message over `fallback`.
    #[must_use]
    pub fn client(source: ClientError, fallback: &str) -> Self {
        let message = match &source {
            ClientError::Api { detail, .. } => detail.clone(),
            ClientError::Network(_) => "Backend not reachable".to_string(),
            ClientError::Parse { .. } | ClientError::Internal(_) => fallback.to_string(),
        };
        Self::Client { message, source }
    }

    /// Whether the failure means the backend is unreachable.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Client { source, .. } if source.is_transport())
    }
}

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_message_prefers_detail() {
        let err = AdminError::client(
            ClientError::Api {
                endpoint: "/allergens".to_string(),
                status: 409,
                detail: "Allergen already exists".to_string(),
            },
            "Save failed",
        );
        assert_eq!(err.to_string(), "Allergen already exists");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_store_message_fallback() {
        let err = AdminError::client(
            ClientError::Parse {
                endpoint: "/allergens".to_string(),
                message: "expected an object".to_string(),
            },
            "Save failed",
        );
        assert_eq!(err.to_string(), "Save failed");
        assert_eq!(AdminError::Offline.to_string(), "Backend offline");
    }
}
