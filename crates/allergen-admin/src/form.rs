//! The create/edit form.
//!
//! Keywords are entered as one comma-separated string and sent to the store
//! as a list.

use crate::error::{AdminError, Result};
use allergen_client::AllergenDraft;
use allergen_core::{AllergenRecord, Severity};
use serde::{Deserialize, Serialize};

/// Raw form input for creating or editing an allergen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenForm {
    /// Display name
    pub name: String,
    /// Comma-separated keywords, e.g. `"peanut, groundnut"`
    pub keywords: String,
    /// Severity tier, `Medium` unless chosen
    #[serde(default)]
    pub severity: Severity,
}

impl AllergenForm {
    /// Create a form from raw values.
    #[must_use]
    pub fn new(name: impl Into<String>, keywords: impl Into<String>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.into(),
            severity,
        }
    }

    /// Prefill a form for editing `record`.
    #[must_use]
    pub fn from_record(record: &AllergenRecord) -> Self {
        Self {
            name: record.name.clone(),
            keywords: record.keywords.join(", "),
            severity: record.severity,
        }
    }

    /// Validate the form and build the request body.
    pub fn to_draft(&self) -> Result<AllergenDraft> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AdminError::Validation("Please enter allergen name".to_string()));
        }

        let keywords = parse_keywords(&self.keywords);
        if keywords.is_empty() {
            return Err(AdminError::Validation("Please enter keywords".to_string()));
        }

        Ok(AllergenDraft {
            name: name.to_string(),
            keywords,
            severity: self.severity,
        })
    }
}

/// Split comma-separated input into trimmed, non-empty keywords.
#[must_use]
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use allergen_core::AllergenId;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_keywords(" peanut, groundnut ,, arachis oil ,"),
            vec!["peanut", "groundnut", "arachis oil"]
        );
        assert!(parse_keywords(" , ,").is_empty());
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn test_to_draft() {
        let form = AllergenForm::new("  Sesame ", "sesame, tahini", Severity::High);
        let draft = form.to_draft().expect("valid form");
        assert_eq!(draft.name, "Sesame");
        assert_eq!(draft.keywords, vec!["sesame", "tahini"]);
        assert_eq!(draft.severity, Severity::High);
    }

    #[test]
    fn test_validation() {
        let missing_name = AllergenForm::new(" ", "egg", Severity::Low);
        assert!(matches!(
            missing_name.to_draft(),
            Err(AdminError::Validation(msg)) if msg == "Please enter allergen name"
        ));

        let missing_keywords = AllergenForm::new("Egg", " , ", Severity::Low);
        assert!(matches!(
            missing_keywords.to_draft(),
            Err(AdminError::Validation(msg)) if msg == "Please enter keywords"
        ));
    }

    #[test]
    fn test_from_record_roundtrip() {
        let record = AllergenRecord {
            id: AllergenId::new("a9").expect("valid id"),
            name: "Shellfish".to_string(),
            keywords: vec!["shrimp".to_string(), "crab".to_string()],
            severity: Severity::High,
        };
        let form = AllergenForm::from_record(&record);
        assert_eq!(form.keywords, "shrimp, crab");
        assert_eq!(form.to_draft().expect("valid").keywords, record.keywords);
    }

    #[test]
    fn test_default_severity_is_medium() {
        let form: AllergenForm =
            serde_json::from_str(r#"{"name":"Mustard","keywords":"mustard"}"#).expect("parse");
        assert_eq!(form.severity, Severity::Medium);
    }
}
