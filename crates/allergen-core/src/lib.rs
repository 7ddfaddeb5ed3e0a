//! Allergen Core - Foundation crate for the allergy detector.
//!
//! This crate provides the domain types, error handling and configuration
//! management that the client, scan and admin crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Allergen records, selections, input payloads, match spans and reports
//!
//! # Example
//!
//! ```rust
//! use allergen_core::{AllergenId, AppConfig, Selection};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.limits.max_text_chars, 5000);
//!
//! let selection = Selection::new().toggled(&AllergenId::new("peanut-id")?);
//! assert_eq!(selection.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BackendConfig, InputLimits, PacingConfig};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{
    AllergenId, AllergenRecord, BackendStatus, FileUpload, InputMode, InputPayload, MatchSpan,
    Position, ScanReport, ScanResponse, Selection, Severity, WizardStage,
};
