//! Error taxonomy for the scan workflow.

use allergen_client::ClientError;
use allergen_core::{AllergenId, InputMode, WizardStage};
use std::fmt;
use thiserror::Error;

/// Which backend a connectivity failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The allergen CRUD store
    AllergenStore,
    /// The keyword scanning service
    ScanService,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllergenStore => write!(f, "allergen store"),
            Self::ScanService => write!(f, "scanning service"),
        }
    }
}

/// A local precondition that was not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("Select at least one allergen to scan for")]
    EmptySelection,

    #[error("Allergen data is still loading")]
    CatalogLoading,

    #[error("Choose an input method first")]
    NoInputMode,

    #[error("Enter some text to scan")]
    EmptyText,

    #[error("Upload a photo to scan")]
    MissingPhoto,

    #[error("Upload a document to scan")]
    MissingDocument,

    #[error("Unknown allergen: {0}")]
    UnknownAllergen(AllergenId),

    #[error("Text is {actual} characters long, the limit is {limit}")]
    TextTooLong { actual: usize, limit: usize },

    #[error("{filename} is {actual} bytes, the {mode} limit is {limit} bytes")]
    FileTooLarge {
        filename: String,
        mode: InputMode,
        actual: usize,
        limit: usize,
    },

    #[error("{filename} is not a supported {mode} file (expected one of: {expected})")]
    UnsupportedFileType {
        filename: String,
        mode: InputMode,
        expected: String,
    },
}

impl Precondition {
    /// The "nothing to scan" precondition for a mode.
    #[must_use]
    pub fn missing_payload(mode: InputMode) -> Self {
        match mode {
            InputMode::Text => Self::EmptyText,
            InputMode::Photo => Self::MissingPhoto,
            InputMode::Document => Self::MissingDocument,
        }
    }
}

/// Errors surfaced by the catalog, the session and the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A backend could not be reached; retrying may help
    #[error("Cannot reach the {backend}: {message}")]
    Connectivity { backend: Backend, message: String },

    /// A local precondition failed; nothing was sent
    #[error("{0}")]
    Validation(Precondition),

    /// Payload does not fit the active input mode
    #[error("Invalid input mode: {0}")]
    InvalidMode(String),

    /// The scanning service refused the request; message is the service's own
    #[error("{0}")]
    ServiceRejection(String),

    /// An operation was attempted in a stage that does not allow it
    #[error("{operation} is not allowed in the {stage} stage")]
    StateViolation {
        stage: WizardStage,
        operation: &'static str,
    },

    /// The outcome arrived after a reset and was dropped
    #[error("Scan result discarded after the session was reset")]
    Superseded,
}

impl ScanError {
    /// Map a scanning service failure onto the taxonomy.
    ///
    /// Transport failures are connectivity problems; anything the service
    /// answered is a rejection carrying its message unchanged.
    #[must_use]
    pub fn from_scan_failure(err: ClientError) -> Self {
        match err {
            ClientError::Network(e) => Self::Connectivity {
                backend: Backend::ScanService,
                message: e.to_string(),
            },
            ClientError::Api { detail, .. } => Self::ServiceRejection(detail),
            other => Self::ServiceRejection(other.to_string()),
        }
    }

    /// Any failure to load from the store leaves it unusable for the session.
    #[must_use]
    pub fn from_store_failure(err: &ClientError) -> Self {
        Self::Connectivity {
            backend: Backend::AllergenStore,
            message: err.to_string(),
        }
    }

    /// Build and log a state violation.
    #[must_use]
    pub fn state_violation(stage: WizardStage, operation: &'static str) -> Self {
        tracing::error!(%stage, operation, "operation attempted in wrong wizard stage");
        Self::StateViolation { stage, operation }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "CONNECTIVITY",
            Self::Validation(_) => "VALIDATION",
            Self::InvalidMode(_) => "INVALID_MODE",
            Self::ServiceRejection(_) => "SERVICE_REJECTION",
            Self::StateViolation { .. } => "STATE_VIOLATION",
            Self::Superseded => "SUPERSEDED",
        }
    }

    /// Whether retrying the same operation later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

impl From<Precondition> for ScanError {
    fn from(precondition: Precondition) -> Self {
        Self::Validation(precondition)
    }
}

/// Result type alias for scan workflow operations.
pub type Result<T> = std::result::Result<T, ScanError>;
