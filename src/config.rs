//! Server configuration: the models to serve and how to provision them.
//!
//! Loaded from a TOML file (or JSON, by extension). Provisioning limits can
//! be overridden through environment variables; invalid values are ignored.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `SERVABLE_MAX_CONCURRENT_LOADS` | CPU count | Engines constructed in parallel per model |
//! | `SERVABLE_LOAD_TIMEOUT_SECS` | none | Per-version construction deadline (0 = none) |
//!
//! # Example
//!
//! ```toml
//! [provisioning]
//! max_concurrent_loads = 2
//! load_timeout_secs = 120
//!
//! [[models]]
//! name = "resnet"
//! base_path = "/models/resnet"
//! batch_size = 8
//! model_version_policy = { latest = { num_versions = 2 } }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ModelSpec, ProvisionConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// `[provisioning]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningSection {
    #[serde(default)]
    pub max_concurrent_loads: Option<usize>,
    #[serde(default)]
    pub load_timeout_secs: Option<u64>,
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub provisioning: ProvisioningSection,
    pub models: Vec<ModelSpec>,
}

/// Parse a `usize` env var, returning `None` on missing or invalid.
fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse::<usize>().ok()
}

/// Parse a `u64` env var, returning `None` on missing or invalid.
fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse::<u64>().ok()
}

impl ServerConfig {
    /// Load and validate a config file. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks. Policy documents are validated when each model
    /// is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::Invalid("no models configured".into()));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(ConfigError::Invalid("model name cannot be empty".into()));
            }
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate model name: {}",
                    model.name
                )));
            }
            if model.batch_size == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "batch_size of model {} must be positive",
                    model.name
                )));
            }
        }
        Ok(())
    }

    /// Effective provisioning limits: environment, then file, then defaults.
    pub fn provision_config(&self) -> ProvisionConfig {
        let defaults = ProvisionConfig::default();

        let max_concurrent_loads = env_usize("SERVABLE_MAX_CONCURRENT_LOADS")
            .or(self.provisioning.max_concurrent_loads)
            .unwrap_or(defaults.max_concurrent_loads)
            .max(1);

        let load_timeout = env_u64("SERVABLE_LOAD_TIMEOUT_SECS")
            .or(self.provisioning.load_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        ProvisionConfig {
            max_concurrent_loads,
            load_timeout,
        }
    }
}
