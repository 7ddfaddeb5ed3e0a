//! `allergen admin`: maintain the catalog.

use crate::cli::AdminAction;
use crate::error::CliError;
use crate::output::{CatalogOutput, OutputWriter, RecordOutput, StatusOutput};
use crate::state::AppState;
use allergen_admin::{AdminConsole, AllergenForm};
use allergen_core::{AllergenId, AllergenRecord, Severity};

/// Dispatch one admin action.
pub async fn execute(
    state: &AppState,
    action: &AdminAction,
    output: &OutputWriter,
) -> Result<(), CliError> {
    let console = state.admin();

    match action {
        AdminAction::Status => {
            let status = console.check_status().await;
            output.render(&StatusOutput { status })
        }
        AdminAction::Sync => {
            console.sync().await?;
            output.render(&CatalogOutput {
                status: console.status(),
                allergens: console.records(),
            })
        }
        AdminAction::Add {
            name,
            keywords,
            severity,
        } => {
            console.sync().await?;
            let severity = severity.parse::<Severity>()?;
            let form = AllergenForm::new(name.as_str(), keywords.as_str(), severity);
            let allergen = console.save(&form, None).await?;
            output.render(&RecordOutput {
                action: "Added",
                allergen,
            })
        }
        AdminAction::Edit {
            id,
            name,
            keywords,
            severity,
        } => {
            let id = AllergenId::new(id.as_str())?;
            let form = edit_form(
                &console,
                &id,
                name.as_deref(),
                keywords.as_deref(),
                severity.as_deref(),
            )
            .await?;
            let allergen = console.save(&form, Some(&id)).await?;
            output.render(&RecordOutput {
                action: "Updated",
                allergen,
            })
        }
        AdminAction::Delete { id } => {
            let id = AllergenId::new(id.as_str())?;
            console.sync().await?;
            let allergen = find(&console, &id)?;
            console.delete(&id).await?;
            output.render(&RecordOutput {
                action: "Deleted",
                allergen,
            })
        }
    }
}

/// Prefill a form from the stored record and apply the given overrides.
async fn edit_form(
    console: &AdminConsole,
    id: &AllergenId,
    name: Option<&str>,
    keywords: Option<&str>,
    severity: Option<&str>,
) -> Result<AllergenForm, CliError> {
    console.sync().await?;
    let mut form = AllergenForm::from_record(&find(console, id)?);

    if let Some(name) = name {
        form.name = name.to_string();
    }
    if let Some(keywords) = keywords {
        form.keywords = keywords.to_string();
    }
    if let Some(severity) = severity {
        form.severity = severity.parse::<Severity>()?;
    }
    Ok(form)
}

fn find(console: &AdminConsole, id: &AllergenId) -> Result<AllergenRecord, CliError> {
    console
        .find(id)
        .ok_or_else(|| CliError::Command(format!("Allergen '{id}' not found")))
}
