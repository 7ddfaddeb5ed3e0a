//! Allergen Admin - maintenance console for the allergen catalog.
//!
//! A thin façade over the allergen store that mirrors what the admin screen
//! does: probe the backend, list records, and create, edit or delete them.
//! Saving is refused while the backend is not known to be reachable.
//!
//! ## Example
//!
//! ```rust,ignore
//! use allergen_admin::{AdminConsole, AllergenForm};
//!
//! let console = AdminConsole::new(store);
//! console.sync().await?;
//!
//! let form = AllergenForm::new("Sesame", "sesame, tahini", Severity::High);
//! console.save(&form, None).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

/// Admin console over the allergen store.
pub mod console;
/// Error types for admin operations.
pub mod error;
/// Create and edit form handling.
pub mod form;

pub use console::AdminConsole;
pub use error::{AdminError, Result};
pub use form::{parse_keywords, AllergenForm};
