//! Configuration and file management for beanstack stores
//!
//! This crate provides:
//! - Platform paths for persisted state and log files
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - A file-backed storage engine and backend selection

pub mod app_config;
pub mod config_file;
pub mod files;
pub mod paths;

pub use app_config::{AppConfig, StorageBackend, StorageSettings};
pub use config_file::load_config_file;
pub use files::{open_storage, FileStorage};
