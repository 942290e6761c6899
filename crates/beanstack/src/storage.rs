//! Persistence backends
//!
//! A backend stores one JSON blob per key. There is no transactionality:
//! `save` overwrites, `load` returns whatever was last written. Backends should
//! report an unreadable blob as absent rather than failing, but write failures
//! are surfaced to the caller.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Key/value blob store used to persist state between runs
pub trait StorageEngine: Send + Sync {
    /// Overwrite whatever is stored under `key`
    fn save(&self, key: &str, data: &Value) -> Result<(), StorageError>;

    /// Previously saved data, or `None` if nothing (readable) is stored
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Delete one top-level field from the blob at `key`, if present
    fn remove(&self, key: &str, field: &str) -> Result<(), StorageError>;

    /// Delete the whole blob at `key`
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend holding serialized JSON text per key
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with `data` under `key`
    pub fn with_blob(key: &str, data: &Value) -> Result<Self, StorageError> {
        let storage = Self::new();
        storage.save(key, data)?;
        Ok(storage)
    }
}

impl StorageEngine for MemoryStorage {
    fn save(&self, key: &str, data: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(data)?;
        self.blobs.lock().insert(key.to_string(), text);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let blobs = self.blobs.lock();
        let Some(text) = blobs.get(key) else {
            return Ok(None);
        };
        match serde_json::from_str(text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable blob under '{}': {}", key, e);
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
        self.blobs.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        storage.save("app", &json!({ "count": 3 })).unwrap();

        assert_eq!(storage.load("app").unwrap(), Some(json!({ "count": 3 })));
        assert_eq!(storage.load("other").unwrap(), None);
    }

    #[test]
    fn test_save_overwrites() {
        let storage = MemoryStorage::with_blob("app", &json!({ "a": 1 })).unwrap();
        storage.save("app", &json!({ "b": 2 })).unwrap();

        assert_eq!(storage.load("app").unwrap(), Some(json!({ "b": 2 })));
    }

    #[test]
    fn test_remove_field() {
        let storage = MemoryStorage::with_blob("app", &json!({ "a": 1, "b": 2 })).unwrap();
        storage.remove("app", "a").unwrap();
        storage.remove("app", "missing").unwrap();
        storage.remove("nothing-here", "a").unwrap();

        assert_eq!(storage.load("app").unwrap(), Some(json!({ "b": 2 })));
    }

    #[test]
    fn test_clear() {
        let storage = MemoryStorage::with_blob("app", &json!({ "a": 1 })).unwrap();
        storage.clear("app").unwrap();
        storage.clear("app").unwrap();

        assert_eq!(storage.load("app").unwrap(), None);
    }

    #[test]
    fn test_corrupt_blob_reads_as_absent() {
        let storage = MemoryStorage::new();
        storage
            .blobs
            .lock()
            .insert("app".to_string(), "{not json".to_string());

        assert_eq!(storage.load("app").unwrap(), None);
    }
}
