//! Allergen store access (`/allergens`).

use crate::error::Result;
use crate::http::{build_http_client, check_status, endpoint_url, parse_json};
use allergen_core::{AllergenId, AllergenRecord, BackendConfig, Severity};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ALLERGENS_PATH: &str = "/allergens";

/// CRUD access to allergen records.
///
/// Implementations must be thread-safe (Send + Sync) so one store can back
/// both the scan catalog and the admin console.
#[async_trait]
pub trait AllergenStore: Send + Sync {
    /// Fetch every record, in store order.
    async fn list(&self) -> Result<Vec<AllergenRecord>>;

    /// Create a record and return it as stored.
    async fn create(&self, draft: &AllergenDraft) -> Result<AllergenRecord>;

    /// Replace the record with `id` and return it as stored.
    async fn update(&self, id: &AllergenId, draft: &AllergenDraft) -> Result<AllergenRecord>;

    /// Remove the record with `id`.
    async fn delete(&self, id: &AllergenId) -> Result<()>;
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenDraft {
    /// Display name
    pub name: String,
    /// Detection keywords
    pub keywords: Vec<String>,
    /// Severity tier
    pub severity: Severity,
}

/// Allergen store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAllergenStore {
    client: Client,
    base_url: String,
}

impl HttpAllergenStore {
    /// Create a store client for `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Create a store client from the backend section of the configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    fn collection_url(&self) -> String {
        endpoint_url(&self.base_url, ALLERGENS_PATH)
    }

    fn record_url(&self, id: &AllergenId) -> String {
        endpoint_url(
            &self.base_url,
            &format!("{ALLERGENS_PATH}/{}", urlencoding::encode(id.as_str())),
        )
    }
}

#[async_trait]
impl AllergenStore for HttpAllergenStore {
    async fn list(&self) -> Result<Vec<AllergenRecord>> {
        let response = self.client.get(self.collection_url()).send().await?;
        let response = check_status(response, ALLERGENS_PATH, "Failed to load allergens").await?;
        let records: Vec<AllergenRecord> = parse_json(response, ALLERGENS_PATH).await?;
        tracing::debug!(count = records.len(), "fetched allergen records");
        Ok(records)
    }

    async fn create(&self, draft: &AllergenDraft) -> Result<AllergenRecord> {
        let response = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await?;
        let response = check_status(response, ALLERGENS_PATH, "Save failed").await?;
        parse_json(response, ALLERGENS_PATH).await
    }

    async fn update(&self, id: &AllergenId, draft: &AllergenDraft) -> Result<AllergenRecord> {
        let endpoint = format!("{ALLERGENS_PATH}/{id}");
        let response = self
            .client
            .put(self.record_url(id))
            .json(draft)
            .send()
            .await?;
        let response = check_status(response, &endpoint, "Save failed").await?;
        parse_json(response, &endpoint).await
    }

    async fn delete(&self, id: &AllergenId) -> Result<()> {
        let endpoint = format!("{ALLERGENS_PATH}/{id}");
        let response = self.client.delete(self.record_url(id)).send().await?;
        check_status(response, &endpoint, "Delete failed").await?;
        Ok(())
    }
}
