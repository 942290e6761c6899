//! File-backed storage and backend selection
//!
//! Each storage key maps to `<directory>/<key>.json`. Writes go through a
//! temporary file that is synced and renamed over the target, so a crash
//! leaves either the old or the new blob, never a partial one.

use crate::app_config::{StorageBackend, StorageSettings};
use crate::paths;
use anyhow::{Context, Result};
use beanstack::{MemoryStorage, StorageEngine, StorageError};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage engine keeping one JSON file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Use `directory`, creating it if needed
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).with_context(|| {
            format!("Failed to create storage directory {}", directory.display())
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(StorageError::Backend(format!(
                "storage key '{key}' cannot be used as a file name"
            )));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

/// Write `content` to `path` via a synced temp file and rename
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("json.tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

impl StorageEngine for FileStorage {
    fn save(&self, key: &str, data: &Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let content = serde_json::to_string_pretty(data)?;
        atomic_write(&path, &content)?;
        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn remove(&self, key: &str, field: &str) -> Result<(), StorageError> {
        if let Some(Value::Object(mut map)) = self.load(key)? {
            if map.remove(field).is_some() {
                self.save(key, &Value::Object(map))?;
            }
        }
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Build the storage engine selected in the `[storage]` table
pub fn open_storage(settings: &StorageSettings) -> Result<Arc<dyn StorageEngine>> {
    match settings.backend {
        StorageBackend::Memory => {
            log::debug!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::File => {
            let directory = match &settings.directory {
                Some(directory) => directory.clone(),
                None => paths::data_dir()?,
            };
            log::debug!("Using file storage in {}", directory.display());
            Ok(Arc::new(FileStorage::new(directory)?))
        }
    }
}
