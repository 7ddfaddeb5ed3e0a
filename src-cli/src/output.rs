//! Text and JSON rendering of command output.
//!
//! Every payload implements both [`Render`] (text) and `Serialize` (JSON);
//! command handlers only call [`OutputWriter::render`].

use crate::cli::OutputFormat;
use crate::error::CliError;
use allergen_core::{AllergenRecord, BackendStatus, MatchSpan, ScanReport};
use serde::Serialize;
use std::io::Write;

/// Keywords shown per allergen before collapsing the rest into "+N".
const KEYWORD_PREVIEW: usize = 3;

/// Writes payloads to stdout in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a writer for `format`.
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Selected format.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to any writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering.
pub trait Render {
    /// Write the payload as text.
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// The allergen catalog with its backend status.
#[derive(Debug, Serialize)]
pub struct CatalogOutput {
    /// Reachability of the allergen store
    pub status: BackendStatus,
    /// Records in store order
    pub allergens: Vec<AllergenRecord>,
}

impl Render for CatalogOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Backend: {}", self.status)?;
        if self.allergens.is_empty() {
            writeln!(w, "No allergens found.")?;
            return Ok(());
        }

        writeln!(w, "{:<26} {:<20} {:<8} Keywords", "ID", "Name", "Severity")?;
        writeln!(w, "{}", "-".repeat(80))?;
        for record in &self.allergens {
            writeln!(
                w,
                "{:<26} {:<20} {:<8} {}",
                record.id,
                record.name,
                record.severity,
                keyword_summary(record)
            )?;
        }
        writeln!(w, "{} allergens", self.allergens.len())?;
        Ok(())
    }
}

/// Comma-joined keyword preview with a "+N" tail for the hidden ones.
#[must_use]
pub fn keyword_summary(record: &AllergenRecord) -> String {
    let (shown, hidden) = record.keyword_preview(KEYWORD_PREVIEW);
    let mut summary = shown.join(", ");
    if hidden > 0 {
        summary.push_str(&format!(" +{hidden}"));
    }
    summary
}

/// Backend reachability alone.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    /// Reachability of the allergen store
    pub status: BackendStatus,
}

impl Render for StatusOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Backend: {}", self.status)
    }
}

/// A record that was just saved or deleted.
#[derive(Debug, Serialize)]
pub struct RecordOutput {
    /// What happened, e.g. "Added"
    pub action: &'static str,
    /// The record concerned
    pub allergen: AllergenRecord,
}

impl Render for RecordOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{} {} ({}, {}): {}",
            self.action,
            self.allergen.name,
            self.allergen.id,
            self.allergen.severity,
            keyword_summary(&self.allergen)
        )
    }
}

/// The safety report of one scan.
#[derive(Debug, Serialize)]
pub struct ScanOutput {
    /// Overall safety flag from the service
    pub safe: bool,
    /// One-line summary
    pub summary: String,
    /// Selected versus detected counts
    pub tally: String,
    /// Service timestamp
    pub timestamp: String,
    /// Detections in service order
    pub matches: Vec<MatchSpan>,
    /// Submitted text with highlight markup, for text scans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<String>,
}

impl ScanOutput {
    /// Build from a report and the optional highlighted text.
    #[must_use]
    pub fn new(report: &ScanReport, highlighted: Option<String>) -> Self {
        Self {
            safe: report.safe,
            summary: report.summary(),
            tally: report.tally(),
            timestamp: report.timestamp.clone(),
            matches: report.matches.clone(),
            highlighted,
        }
    }
}

impl Render for ScanOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.summary)?;
        writeln!(w, "{}", self.tally)?;
        if !self.timestamp.is_empty() {
            writeln!(w, "Scanned at {}", self.timestamp)?;
        }

        if !self.matches.is_empty() {
            writeln!(w)?;
            for m in &self.matches {
                write!(
                    w,
                    "  [{}] {}: \"{}\"",
                    m.severity, m.allergen_name, m.keyword_found
                )?;
                if let Some(position) = m.position {
                    write!(w, " at {}..{}", position.start, position.end)?;
                }
                writeln!(w)?;
            }
        }

        if let Some(text) = &self.highlighted {
            writeln!(w)?;
            writeln!(w, "{text}")?;
        }
        Ok(())
    }
}
