//! Application state shared by the command handlers.

use crate::error::CliError;
use allergen_admin::AdminConsole;
use allergen_client::{HttpAllergenStore, HttpScanService};
use allergen_core::AppConfig;
use allergen_scan::{AllergenCatalog, ScanSession, WizardStateMachine};
use std::path::Path;
use std::sync::Arc;

/// Loaded configuration plus the HTTP clients for both backends.
pub struct AppState {
    /// Effective configuration after file and environment overrides
    pub config: AppConfig,

    /// Client for `/allergens`
    pub store: Arc<HttpAllergenStore>,

    /// Client for `/scan`
    pub service: Arc<HttpScanService>,
}

impl AppState {
    /// Load configuration and build the backend clients.
    ///
    /// An explicit `config_path` must exist; without one the platform config
    /// file is used when present and defaults otherwise. Environment overrides
    /// apply in both cases.
    pub fn load(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => {
                let mut config = AppConfig::load_from(path)?;
                config.apply_env(|key| std::env::var(key).ok());
                config.validate()?;
                config
            }
            None => AppConfig::load_with_env()?,
        };
        Self::from_config(config)
    }

    /// Build the backend clients for an already loaded configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, CliError> {
        let store = Arc::new(HttpAllergenStore::from_config(&config.backend)?);
        let service = Arc::new(HttpScanService::from_config(&config.backend)?);

        tracing::debug!(
            base_url = %config.backend.base_url,
            timeout_secs = config.backend.timeout_secs,
            "Backend clients ready"
        );

        Ok(Self {
            config,
            store,
            service,
        })
    }

    /// A fresh scan wizard wired to both backends. The catalog is not loaded yet.
    #[must_use]
    pub fn wizard(&self) -> WizardStateMachine {
        let catalog = Arc::new(AllergenCatalog::new(self.store.clone()));
        let session = ScanSession::from_config(self.service.clone(), &self.config);
        WizardStateMachine::new(catalog, session)
    }

    /// An admin console over the allergen store.
    #[must_use]
    pub fn admin(&self) -> AdminConsole {
        AdminConsole::new(self.store.clone())
    }
}
