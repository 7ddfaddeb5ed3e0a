//! `allergen allergens`: list the catalog.

use crate::error::CliError;
use crate::output::{CatalogOutput, OutputWriter};
use crate::state::AppState;
use allergen_scan::AllergenCatalog;

/// Load the catalog once and print it.
pub async fn execute(state: &AppState, output: &OutputWriter) -> Result<(), CliError> {
    let catalog = AllergenCatalog::new(state.store.clone());
    catalog.load().await?;

    output.render(&CatalogOutput {
        status: catalog.status(),
        allergens: catalog.snapshot().to_vec(),
    })
}
