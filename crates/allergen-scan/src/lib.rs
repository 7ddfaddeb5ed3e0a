//! Allergen Scan - the scan workflow engine.
//!
//! This crate turns a set of selected allergens and a piece of user content
//! into a safety report. It owns the client-side workflow only; keyword
//! matching, OCR and document extraction happen in the scanning service.
//!
//! # Components
//!
//! - [`AllergenCatalog`]: cached snapshot of the allergen store plus its reachability
//! - [`ScanSession`]: selection, input payload, local limits and submission
//! - [`ProgressPacer`]: paced progress published while a scan is in flight
//! - [`WizardStateMachine`]: the Select → Input → Processing → Report flow
//! - [`highlight`]: highlight markup for matches in the scanned text
//!
//! # Example
//!
//! ```rust,ignore
//! use allergen_scan::{AllergenCatalog, ScanSession, WizardStateMachine};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(AllergenCatalog::new(store));
//! let wizard = WizardStateMachine::new(catalog, ScanSession::from_config(service, &config));
//!
//! wizard.load_catalog().await?;
//! wizard.toggle(&peanut_id)?;
//! wizard.advance().await?;
//! wizard.set_input_mode(InputMode::Text)?;
//! wizard.set_payload(InputPayload::Text("Contains peanuts".into()))?;
//! wizard.advance().await?;
//!
//! println!("{}", wizard.highlighted_text().unwrap_or_default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
#[allow(missing_docs)]
pub mod error;
pub mod highlight;
pub mod pacing;
pub mod session;
pub mod wizard;

// Re-export commonly used types
pub use catalog::AllergenCatalog;
pub use error::{Backend, Precondition, Result, ScanError};
pub use highlight::{render, strip_markup};
pub use pacing::ProgressPacer;
pub use session::ScanSession;
pub use wizard::WizardStateMachine;
