//! Allergen Client - access to the two backend collaborators.
//!
//! The allergen store (`/allergens`) and the scanning service (`/scan`) are
//! opaque to the rest of the workspace. Each is described by an async trait
//! so the scan engine and the admin console can be driven against any
//! implementation; the reqwest-backed implementations here talk to the real
//! backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use allergen_client::{AllergenStore, HttpAllergenStore};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = HttpAllergenStore::new("http://localhost:8000", Duration::from_secs(30))?;
//! for record in store.list().await? {
//!     println!("{} ({})", record.name, record.severity);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod http;
pub mod scan;
pub mod store;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use scan::{HttpScanService, ScanContent, ScanRequest, ScanService};
pub use store::{AllergenDraft, AllergenStore, HttpAllergenStore};
