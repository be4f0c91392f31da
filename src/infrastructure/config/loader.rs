use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::Settings;

/// Configuration error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("registry_url cannot be empty")]
    EmptyRegistryUrl,

    #[error("document_base_url cannot be empty")]
    EmptyDocumentBaseUrl,

    #[error("Invalid http timeout: {0}. Must be at least 1 second")]
    InvalidHttpTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Settings loader with hierarchical merging
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. conflux.yaml (project config)
    /// 3. conflux.local.yaml (local overrides, optional)
    /// 4. Environment variables (CONFLUX_* prefix, highest priority)
    pub fn load() -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file("conflux.yaml"))
            .merge(Yaml::file("conflux.local.yaml"))
            .merge(Env::prefixed("CONFLUX_").split("__"))
            .extract()
            .context("Failed to extract settings from figment")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load settings from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate settings after loading
    pub fn validate(settings: &Settings) -> Result<(), SettingsError> {
        if settings.registry_url.trim().is_empty() {
            return Err(SettingsError::EmptyRegistryUrl);
        }

        if settings.document_base_url.trim().is_empty() {
            return Err(SettingsError::EmptyDocumentBaseUrl);
        }

        if settings.http.timeout_secs == 0 {
            return Err(SettingsError::InvalidHttpTimeout(settings.http.timeout_secs));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&settings.logging.level.as_str()) {
            return Err(SettingsError::InvalidLogLevel(settings.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&settings.logging.format.as_str()) {
            return Err(SettingsError::InvalidLogFormat(
                settings.logging.format.clone(),
            ));
        }

        Ok(())
    }
}
