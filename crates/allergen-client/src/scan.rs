//! Scanning service access (`/scan`).

use crate::error::{ClientError, Result};
use crate::http::{build_http_client, check_status, endpoint_url, parse_json};
use allergen_core::{AllergenId, BackendConfig, FileUpload, InputPayload, ScanResponse, Selection};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

const SCAN_PATH: &str = "/scan";

/// Multipart field carrying one selected allergen id; repeated per id.
pub const FIELD_SELECTED_IDS: &str = "selected_allergen_ids";
/// Multipart field carrying pasted text.
pub const FIELD_TEXT: &str = "text";
/// Multipart field carrying an uploaded photo or document.
pub const FIELD_FILE: &str = "file";

/// A service that finds allergen keywords in submitted content.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Scan the request's content for the selected allergens.
    async fn scan(&self, request: ScanRequest) -> Result<ScanResponse>;
}

/// Content part of a scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanContent {
    /// Sent as the `text` field
    Text(String),
    /// Sent as the `file` field
    File(FileUpload),
}

/// A packaged scan: selected ids plus one content part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Allergen ids to scan for, in selection order
    pub selected_allergen_ids: Vec<AllergenId>,
    /// What to scan
    pub content: ScanContent,
}

impl ScanRequest {
    /// Package a selection and a payload.
    #[must_use]
    pub fn new(selection: &Selection, payload: &InputPayload) -> Self {
        let content = match payload {
            InputPayload::Text(text) => ScanContent::Text(text.clone()),
            InputPayload::Photo(file) | InputPayload::Document(file) => {
                ScanContent::File(file.clone())
            }
        };

        Self {
            selected_allergen_ids: selection.iter().cloned().collect(),
            content,
        }
    }

    /// The plain-text multipart fields, in the order they are sent.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .selected_allergen_ids
            .iter()
            .map(|id| (FIELD_SELECTED_IDS, id.to_string()))
            .collect();

        if let ScanContent::Text(text) = &self.content {
            fields.push((FIELD_TEXT, text.clone()));
        }

        fields
    }

    /// Build the multipart form.
    ///
    /// # Errors
    /// Returns error if the file part cannot be given a content type.
    pub fn into_form(self) -> Result<Form> {
        let mut form = self
            .text_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        if let ScanContent::File(file) = self.content {
            let content_type = content_type_for(&file);
            let part = Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(content_type)
                .map_err(|e| ClientError::Internal(format!("invalid content type: {e}")))?;
            form = form.part(FIELD_FILE, part);
        }

        Ok(form)
    }
}

/// Content type sent for an uploaded file, derived from its extension.
#[must_use]
pub fn content_type_for(file: &FileUpload) -> &'static str {
    match file.extension().as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Scanning service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpScanService {
    client: Client,
    base_url: String,
}

impl HttpScanService {
    /// Create a scanning client for `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Create a scanning client from the backend section of the configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }
}

#[async_trait]
impl ScanService for HttpScanService {
    async fn scan(&self, request: ScanRequest) -> Result<ScanResponse> {
        let ids = request.selected_allergen_ids.len();
        let form = request.into_form()?;

        let response = self
            .client
            .post(endpoint_url(&self.base_url, SCAN_PATH))
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response, SCAN_PATH, "Scan failed").await?;
        let body: ScanResponse = parse_json(response, SCAN_PATH).await?;

        tracing::debug!(
            selected = ids,
            matches = body.matches.len(),
            safe = body.safe,
            "scan completed"
        );

        Ok(body)
    }
}
