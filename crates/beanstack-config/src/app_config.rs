//! Application configuration
//!
//! Configuration loaded from .beanstack.toml file.

use anyhow::{Context, Result};
use beanstack::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which storage backend persists store state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per storage key
    #[default]
    File,
    /// Process-local; nothing survives a restart
    Memory,
}

/// `[storage]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend; the platform data directory if unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Application configuration loaded from .beanstack.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreOptions,

    #[serde(default)]
    pub storage: StorageSettings,

    /// Minimum interval between two actions of the same type
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreOptions::default(),
            storage: StorageSettings::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::from_toml(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {:#}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid beanstack configuration")
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.storage_key, "beanstack_state");
        assert_eq!(config.store.history_capacity, 50);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.storage.directory.is_none());
        assert_eq!(config.debounce_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            debounce_ms = 100

            [store]
            storage_key = "counter"
            persist_keys = ["count"]

            [storage]
            backend = "memory"
        "#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.store.storage_key, "counter");
        assert_eq!(config.store.persist_keys, Some(vec!["count".to_string()]));
        // history_capacity should use default
        assert_eq!(config.store.history_capacity, 50);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml = r#"
            [storage]
            directory = "/tmp/beanstack-state"
        "#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(
            config.storage.directory,
            Some(PathBuf::from("/tmp/beanstack-state"))
        );
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.store, StoreOptions::default());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let toml = r#"
            [storage]
            backend = "browser"
        "#;
        assert!(AppConfig::from_toml(toml).is_err());
    }
}
