//! `allergen scan`: run one pass of the wizard from the command line.

use crate::cli::{OutputFormat, ScanArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, ScanOutput};
use crate::state::AppState;
use allergen_core::{AllergenId, AllergenRecord, FileUpload, InputMode, InputPayload};
use allergen_scan::WizardStateMachine;
use std::io::Write;

/// Select, attach the input, submit and print the report.
///
/// A report with detections is printed first and then surfaced as
/// [`CliError::AllergensDetected`] so scripts can branch on the exit code.
pub async fn execute(
    state: &AppState,
    args: &ScanArgs,
    output: &OutputWriter,
) -> Result<(), CliError> {
    let wizard = state.wizard();
    wizard.load_catalog().await?;

    let ids = resolve_allergens(&wizard.catalog().snapshot(), &args.allergens)?;
    for id in &ids {
        wizard.toggle(id)?;
    }
    wizard.advance().await?;

    let payload = payload_from_args(args)?;
    wizard.set_input_mode(payload.mode())?;
    wizard.set_payload(payload)?;

    submit(&wizard, output.format() == OutputFormat::Text).await?;

    let report = wizard
        .report()
        .ok_or_else(|| CliError::Command("scan finished without a report".to_string()))?;
    output.render(&ScanOutput::new(&report, wizard.highlighted_text()))?;

    if report.safe {
        Ok(())
    } else {
        Err(CliError::AllergensDetected(report.detected_count()))
    }
}

/// Advance into processing, echoing progress to stderr when `show_progress`.
async fn submit(wizard: &WizardStateMachine, show_progress: bool) -> Result<(), CliError> {
    let mut progress = wizard.progress();
    let mut watching = show_progress;

    let advance = wizard.advance();
    tokio::pin!(advance);

    let outcome = loop {
        tokio::select! {
            outcome = &mut advance => break outcome,
            changed = progress.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                    continue;
                }
                let value = *progress.borrow_and_update();
                let mut stderr = std::io::stderr();
                write!(stderr, "\rScanning... {value:>3}%")?;
                stderr.flush()?;
            }
        }
    };

    if show_progress {
        eprintln!();
    }
    outcome?;
    Ok(())
}

/// Map each argument to a catalog id, matching the id exactly or the name
/// case-insensitively. Repeated allergens are selected once.
pub fn resolve_allergens(
    catalog: &[AllergenRecord],
    wanted: &[String],
) -> Result<Vec<AllergenId>, CliError> {
    let mut ids: Vec<AllergenId> = Vec::with_capacity(wanted.len());

    for arg in wanted {
        let needle = arg.trim();
        let record = catalog
            .iter()
            .find(|r| r.id.as_str() == needle)
            .or_else(|| catalog.iter().find(|r| r.name.eq_ignore_ascii_case(needle)))
            .ok_or_else(|| CliError::Command(format!("Unknown allergen '{needle}'")))?;

        if !ids.contains(&record.id) {
            ids.push(record.id.clone());
        }
    }

    Ok(ids)
}

/// Build the payload for whichever input flag was given.
pub fn payload_from_args(args: &ScanArgs) -> Result<InputPayload, CliError> {
    let payload = match (&args.text, &args.photo, &args.document) {
        (Some(text), _, _) => InputPayload::Text(text.clone()),
        (None, Some(path), _) => InputPayload::Photo(FileUpload::from_path(path)?),
        (None, None, Some(path)) => InputPayload::Document(FileUpload::from_path(path)?),
        (None, None, None) => {
            return Err(CliError::Command(format!(
                "Provide one of --{}, --{} or --{}",
                InputMode::Text,
                InputMode::Photo,
                InputMode::Document
            )))
        }
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use allergen_core::Severity;
    use std::path::PathBuf;

    fn record(id: &str, name: &str) -> AllergenRecord {
        AllergenRecord {
            id: AllergenId::new(id).expect("valid id"),
            name: name.to_string(),
            keywords: vec![name.to_lowercase()],
            severity: Severity::High,
        }
    }

    fn args(text: Option<&str>, photo: Option<PathBuf>) -> ScanArgs {
        ScanArgs {
            allergens: vec!["a1".to_string()],
            text: text.map(ToString::to_string),
            photo,
            document: None,
        }
    }

    #[test]
    fn test_resolve_by_id_or_name() {
        let catalog = vec![record("a1", "Peanut"), record("a2", "Milk")];
        let wanted = vec!["milk".to_string(), "a1".to_string(), " MILK ".to_string()];

        let ids = resolve_allergens(&catalog, &wanted).expect("resolve");
        let ids: Vec<&str> = ids.iter().map(AllergenId::as_str).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    #[test]
    fn test_resolve_unknown_allergen() {
        let catalog = vec![record("a1", "Peanut")];
        let err = resolve_allergens(&catalog, &["Gluten".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown allergen 'Gluten'");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_text_payload() {
        let payload = payload_from_args(&args(Some("Contains peanuts"), None)).expect("payload");
        assert_eq!(payload, InputPayload::Text("Contains peanuts".to_string()));
    }

    #[test]
    fn test_photo_payload_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("label.PNG");
        std::fs::write(&path, b"\x89PNG").expect("write");

        let payload = payload_from_args(&args(None, Some(path))).expect("payload");
        let file = payload.file().expect("file payload");
        assert_eq!(payload.mode(), InputMode::Photo);
        assert_eq!(file.filename, "label.PNG");
        assert_eq!(file.extension().as_deref(), Some("png"));
    }

    #[test]
    fn test_missing_photo_is_io_error() {
        let err = payload_from_args(&args(None, Some(PathBuf::from("/nonexistent/label.jpg"))))
            .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
