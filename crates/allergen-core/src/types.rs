//! Shared types used across the allergy detector.
//!
//! This module defines the allergen records served by the store, the
//! selection and input payload a user builds up in the wizard, and the
//! match spans and report returned by the scanning service.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Newtype for allergen identifiers assigned by the store.
///
/// The store owns the format; the only constraint enforced here is that the
/// identifier is not blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AllergenId(String);

impl AllergenId {
    /// Create a new `AllergenId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is empty or whitespace only.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::Validation(
                "allergen id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AllergenId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AllergenId> for String {
    fn from(id: AllergenId) -> Self {
        id.0
    }
}

impl fmt::Display for AllergenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity tier of an allergen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Severe reactions
    #[serde(alias = "high", alias = "High")]
    High,
    /// Moderate reactions
    #[default]
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    /// Mild reactions
    #[serde(alias = "low", alias = "Low")]
    Low,
}

impl Severity {
    /// Upper-case wire name (`HIGH`, `MEDIUM`, `LOW`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Lower-case tag used to style highlighted fragments.
    #[must_use]
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(CoreError::Validation(format!(
                "invalid severity '{other}': expected HIGH, MEDIUM or LOW"
            ))),
        }
    }
}

/// An allergy category with its detection keywords, as served by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenRecord {
    /// Store-assigned identifier (`id` or `_id` on the wire)
    #[serde(alias = "_id")]
    pub id: AllergenId,
    /// Display name
    pub name: String,
    /// Detection keywords in store order
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Severity tier
    #[serde(default)]
    pub severity: Severity,
}

impl AllergenRecord {
    /// First `limit` keywords plus the number of keywords left out.
    #[must_use]
    pub fn keyword_preview(&self, limit: usize) -> (&[String], usize) {
        let shown = self.keywords.len().min(limit);
        (&self.keywords[..shown], self.keywords.len() - shown)
    }
}

/// The set of allergen ids a user chose to scan for.
///
/// Selections are values: [`Selection::toggled`] returns a new selection and
/// leaves the receiver untouched, so a selection handed to a renderer can
/// never change underneath it. Iteration is in sorted id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(BTreeSet<AllergenId>);

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `id` added if absent or removed if present.
    #[must_use]
    pub fn toggled(&self, id: &AllergenId) -> Self {
        let mut ids = self.0.clone();
        if !ids.remove(id) {
            ids.insert(id.clone());
        }
        Self(ids)
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &AllergenId) -> bool {
        self.0.contains(id)
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the selected ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &AllergenId> {
        self.0.iter()
    }
}

impl FromIterator<AllergenId> for Selection {
    fn from_iter<T: IntoIterator<Item = AllergenId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The kind of content submitted for scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Pasted ingredients, prescription or recipe text
    Text,
    /// Photographed label, text extracted by the service
    Photo,
    /// PDF or Word document, text extracted by the service
    Document,
}

impl InputMode {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "photo" => Ok(Self::Photo),
            "document" => Ok(Self::Document),
            other => Err(CoreError::Validation(format!(
                "invalid input mode '{other}': expected text, photo or document"
            ))),
        }
    }
}

/// An uploaded file.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name, sent as the multipart filename
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Create an upload from a name and contents.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read an upload from disk, keeping only the file name component.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CoreError::Validation(format!("'{}' has no file name", path.display()))
            })?;
        Ok(Self { filename, bytes })
    }

    /// Lower-case extension without the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no contents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Content attached to a scan; exactly one variant per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPayload {
    /// Free text
    Text(String),
    /// Photographed label
    Photo(FileUpload),
    /// Document
    Document(FileUpload),
}

impl InputPayload {
    /// The mode this payload belongs to.
    #[must_use]
    pub fn mode(&self) -> InputMode {
        match self {
            Self::Text(_) => InputMode::Text,
            Self::Photo(_) => InputMode::Photo,
            Self::Document(_) => InputMode::Document,
        }
    }

    /// Whether there is nothing to scan. Whitespace-only text counts as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Photo(file) | Self::Document(file) => file.is_empty(),
        }
    }

    /// The text, for text payloads.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Photo(_) | Self::Document(_) => None,
        }
    }

    /// The file, for photo and document payloads.
    #[must_use]
    pub fn file(&self) -> Option<&FileUpload> {
        match self {
            Self::Text(_) => None,
            Self::Photo(file) | Self::Document(file) => Some(file),
        }
    }
}

/// Character offsets of a match within the scanned text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// First character of the match
    pub start: usize,
    /// One past the last character of the match
    pub end: usize,
}

impl Position {
    /// Length in characters; zero for inverted spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single detection reported by the scanning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// Allergen display name
    #[serde(rename = "allergen")]
    pub allergen_name: String,
    /// Keyword that matched
    pub keyword_found: String,
    /// Severity of the allergen
    pub severity: Severity,
    /// Where the keyword occurred, when the source could report it
    #[serde(
        default,
        deserialize_with = "deserialize_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Position>,
}

/// Positions arrive as absent, `null`, or an object whose fields may be `null`.
/// Only a position with both offsets counts.
fn deserialize_position<'de, D>(deserializer: D) -> Result<Option<Position>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RawPosition {
        start: Option<usize>,
        end: Option<usize>,
    }

    let raw = Option::<RawPosition>::deserialize(deserializer)?;
    Ok(raw.and_then(|p| match (p.start, p.end) {
        (Some(start), Some(end)) => Some(Position { start, end }),
        _ => None,
    }))
}

/// Success body of `POST /scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    /// Detections in service order
    pub matches: Vec<MatchSpan>,
    /// Overall safety flag
    pub safe: bool,
    /// Service-side timestamp, passed through as text
    #[serde(default)]
    pub timestamp: String,
}

/// The aggregate result of one submission.
///
/// Immutable once built. `safe` is taken from the service as-is and is not
/// recomputed from `matches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Detections in service order
    pub matches: Vec<MatchSpan>,
    /// Overall safety flag as returned by the service
    pub safe: bool,
    /// Service-side timestamp
    pub timestamp: String,
    /// Number of allergens the user asked about
    pub total_allergens_selected: usize,
    /// When the report was received locally
    pub received_at: DateTime<Utc>,
}

impl ScanReport {
    /// Build a report from a service response.
    #[must_use]
    pub fn from_response(response: ScanResponse, total_allergens_selected: usize) -> Self {
        Self {
            matches: response.matches,
            safe: response.safe,
            timestamp: response.timestamp,
            total_allergens_selected,
            received_at: Utc::now(),
        }
    }

    /// Number of detections.
    #[must_use]
    pub fn detected_count(&self) -> usize {
        self.matches.len()
    }

    /// Allergen names of all detections, in report order.
    #[must_use]
    pub fn allergen_names(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|m| m.allergen_name.as_str())
            .collect()
    }

    /// Detections that carry a position.
    pub fn located_matches(&self) -> impl Iterator<Item = &MatchSpan> {
        self.matches.iter().filter(|m| m.position.is_some())
    }

    /// One-line plain text summary, suitable for the clipboard.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.safe {
            "All Clear! No allergens detected.".to_string()
        } else {
            format!(
                "{} allergens found: {}.",
                self.detected_count(),
                self.allergen_names().join(", ")
            )
        }
    }

    /// Selected versus detected counts.
    #[must_use]
    pub fn tally(&self) -> String {
        format!(
            "Scanned {} allergens | Found {}",
            self.total_allergens_selected,
            self.detected_count()
        )
    }
}

/// The four fixed wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStage {
    /// Choose allergens
    Select,
    /// Choose and fill an input mode
    Input,
    /// Scan outstanding
    Processing,
    /// Safety report available
    Report,
}

impl WizardStage {
    /// Zero-based step number.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Select => 0,
            Self::Input => 1,
            Self::Processing => 2,
            Self::Report => 3,
        }
    }

    /// Step title shown to the user.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Select => "Your Allergies",
            Self::Input => "Choose Input",
            Self::Processing => "Processing",
            Self::Report => "Safety Report",
        }
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Input => "input",
            Self::Processing => "processing",
            Self::Report => "report",
        };
        write!(f, "{name}")
    }
}

/// Reachability of the backend as shown to the user.
///
/// Three states rather than a boolean so a probe in flight is distinguishable
/// from a failed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Last call succeeded
    Connected,
    /// A call is in flight and nothing has been established yet
    #[default]
    Checking,
    /// Last call failed at the transport level
    Disconnected,
}

impl BackendStatus {
    /// Whether the backend is known to be reachable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Checking => "checking",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{name}")
    }
}
