//! Data and cache directory paths
//!
//! Uses platform directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.local/share/beanstack/`, `~/.cache/beanstack/`
//! - macOS: `~/Library/Application Support/beanstack/`, `~/Library/Caches/beanstack/`
//! - Windows: `%APPDATA%\beanstack\`, `%LOCALAPPDATA%\beanstack\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "beanstack";

/// Get the directory persisted state is written to by default
pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine data directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

/// Get the application cache directory (log files in release builds)
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
    Ok(dir)
}
