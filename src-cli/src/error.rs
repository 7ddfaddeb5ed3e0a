//! CLI error type and exit code mapping.

use allergen_admin::AdminError;
use allergen_core::{ConfigError, CoreError};
use allergen_scan::ScanError;
use serde::Serialize;

/// CLI-specific error type.
///
/// `exit_code()` maps each variant to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A command could not be carried out.
    #[error("{0}")]
    Command(String),

    /// The allergen store or scanning service could not be reached.
    #[error("backend not reachable: {0}")]
    Unreachable(String),

    /// The scan completed and found allergens.
    #[error("{0} allergens detected")]
    AllergensDetected(usize),

    /// JSON serialization failed while rendering output.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Writing output or reading an upload failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                       |
    /// |------|-------------------------------|
    /// | 0    | Success                       |
    /// | 1    | Command error                 |
    /// | 2    | Configuration error           |
    /// | 3    | Backend unreachable           |
    /// | 4    | Scan found allergens          |
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Unreachable(_) => 3,
            Self::AllergensDetected(_) => 4,
            Self::Command(_) | Self::JsonSerialize(_) | Self::Io(_) => 1,
        }
    }

    /// Stable machine-readable code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Command(_) => "COMMAND_FAILED",
            Self::Unreachable(_) => "BACKEND_UNREACHABLE",
            Self::AllergensDetected(_) => "ALLERGENS_DETECTED",
            Self::JsonSerialize(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Serializable form for `--output json`.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable error written to stdout in JSON mode.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    /// Machine-readable code (e.g. `BACKEND_UNREACHABLE`)
    pub code: String,
    /// User-facing message
    pub message: String,
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(e) => Self::Config(e.to_string()),
            CoreError::Io(e) => Self::Io(e),
            CoreError::Validation(msg) => Self::Command(msg),
        }
    }
}

impl From<ScanError> for CliError {
    fn from(err: ScanError) -> Self {
        if err.is_retryable() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

impl From<AdminError> for CliError {
    fn from(err: AdminError) -> Self {
        if matches!(err, AdminError::Offline) || err.is_transport() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

impl From<allergen_client::ClientError> for CliError {
    fn from(err: allergen_client::ClientError) -> Self {
        Self::Config(format!("failed to create backend client: {err}"))
    }
}
