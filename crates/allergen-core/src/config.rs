//! Configuration management for the allergy detector.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/allergy-detector/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Allergen store and scanning service endpoint
    pub backend: BackendConfig,
    /// Cosmetic progress pacing while a scan is in flight
    pub pacing: PacingConfig,
    /// Local input limits checked before anything is sent
    pub limits: InputLimits,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `ALLERGEN_API_URL`: Override the backend base URL
    /// - `ALLERGEN_TIMEOUT_SECS`: Override the request timeout
    /// - `ALLERGEN_PACING_INTERVAL_MS`: Override the progress pacing interval
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ALLERGEN_API_URL") {
            tracing::debug!("Override backend.base_url from env: {}", url);
            self.backend.base_url = url;
        }

        if let Some(secs) = lookup("ALLERGEN_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.backend.timeout_secs = secs;
            tracing::debug!("Override backend.timeout_secs from env: {}", secs);
        }

        if let Some(ms) = lookup("ALLERGEN_PACING_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.pacing.interval_ms = ms;
            tracing::debug!("Override pacing.interval_ms from env: {}", ms);
        }
    }

    /// Check value constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.backend.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url".to_string(),
                reason: format!("must start with http:// or https://, got '{url}'"),
            });
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(step) = self.pacing.steps.iter().find(|s| **s > 100) {
            return Err(ConfigError::InvalidValue {
                field: "pacing.steps".to_string(),
                reason: format!("progress steps are percentages, got {step}"),
            });
        }

        Ok(())
    }

    /// Save configuration to disk at the default location.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/allergy-detector/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "allergen", "allergy-detector")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Backend endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL shared by `/allergens` and `/scan`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Progress pacing shown while a scan is outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Percentages published in order
    pub steps: Vec<u8>,
    /// Delay before each step, in milliseconds
    pub interval_ms: u64,
    /// Delay between a successful scan and the report stage, in milliseconds
    pub settle_ms: u64,
}

impl PacingConfig {
    /// Pacing interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Settle delay as a `Duration`.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            steps: vec![25, 50, 75, 100],
            interval_ms: 400,
            settle_ms: 500,
        }
    }
}

/// Limits applied to input payloads before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    /// Maximum number of characters of pasted text
    pub max_text_chars: usize,
    /// Maximum photo size in bytes
    pub max_photo_bytes: usize,
    /// Maximum document size in bytes
    pub max_document_bytes: usize,
    /// Accepted photo extensions (lower-case, without dot)
    pub photo_extensions: Vec<String>,
    /// Accepted document extensions (lower-case, without dot)
    pub document_extensions: Vec<String>,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 5000,
            max_photo_bytes: 5 * 1024 * 1024,
            max_document_bytes: 10 * 1024 * 1024,
            photo_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            document_extensions: vec!["pdf".to_string(), "doc".to_string(), "docx".to_string()],
        }
    }
}
