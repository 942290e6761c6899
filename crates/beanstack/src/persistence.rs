//! Saving and rehydrating store state through a [`StorageEngine`]

use crate::error::StoreResult;
use crate::snapshot::Snapshot;
use crate::storage::StorageEngine;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Binds a storage backend to a key and an optional allow-list of top-level keys
#[derive(Clone)]
pub struct Persistence {
    engine: Arc<dyn StorageEngine>,
    key: String,
    persist_keys: Option<Vec<String>>,
}

impl Persistence {
    /// An empty allow-list behaves like no allow-list: the whole state is persisted
    pub fn new(
        engine: Arc<dyn StorageEngine>,
        key: impl Into<String>,
        persist_keys: Option<Vec<String>>,
    ) -> Self {
        Self {
            engine,
            key: key.into(),
            persist_keys: persist_keys.filter(|keys| !keys.is_empty()),
        }
    }

    /// Previously persisted state, restricted to the allow-list
    pub fn rehydrate(&self) -> StoreResult<Option<Value>> {
        let stored = match self.engine.load(&self.key)? {
            Some(Value::Object(map)) if !map.is_empty() => map,
            Some(Value::Object(_)) | None => return Ok(None),
            Some(other) => {
                log::warn!(
                    "Ignoring persisted state under '{}': not a mapping ({})",
                    self.key,
                    other
                );
                return Ok(None);
            }
        };
        log::debug!("Rehydrating state from '{}'", self.key);
        Ok(Some(Value::Object(self.select(stored))))
    }

    /// Save `state` (or its allow-listed keys)
    pub fn persist(&self, state: &Snapshot) -> StoreResult<()> {
        let Value::Object(map) = state.to_value() else {
            return Ok(());
        };
        self.engine
            .save(&self.key, &Value::Object(self.select(map)))?;
        Ok(())
    }

    pub fn remove_slice(&self, slice_key: &str) -> StoreResult<()> {
        self.engine.remove(&self.key, slice_key)?;
        Ok(())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.engine.clear(&self.key)?;
        Ok(())
    }

    fn select(&self, mut map: Map<String, Value>) -> Map<String, Value> {
        match &self.persist_keys {
            Some(keys) => keys
                .iter()
                .filter_map(|key| map.remove(key).map(|value| (key.clone(), value)))
                .collect(),
            None => map,
        }
    }
}

/// Deep-merge `stored` into `initial`
///
/// Keys only in `stored` are adopted, mappings present on both sides merge
/// recursively, and for any other overlap the stored value wins.
pub fn merge_state(initial: Value, stored: Value) -> Value {
    match (initial, stored) {
        (Value::Object(mut merged), Value::Object(stored)) => {
            for (key, stored_value) in stored {
                let value = match merged.remove(&key) {
                    Some(initial_value) => merge_state(initial_value, stored_value),
                    None => stored_value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, stored) => stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_merge_adopts_new_keys_and_overrides_scalars() {
        let merged = merge_state(
            json!({ "count": 0, "flag": false }),
            json!({ "count": 5, "extra": "x" }),
        );
        assert_eq!(merged, json!({ "count": 5, "flag": false, "extra": "x" }));
    }

    #[test]
    fn test_merge_recurses_into_mappings() {
        let merged = merge_state(
            json!({ "settings": { "theme": "light", "lang": "en" } }),
            json!({ "settings": { "theme": "dark" } }),
        );
        assert_eq!(
            merged,
            json!({ "settings": { "theme": "dark", "lang": "en" } })
        );
    }

    #[test]
    fn test_merge_stored_non_mapping_replaces_mapping() {
        let merged = merge_state(json!({ "a": { "b": 1 } }), json!({ "a": [1, 2] }));
        assert_eq!(merged, json!({ "a": [1, 2] }));
    }

    #[test]
    fn test_persist_respects_allow_list() {
        let engine = Arc::new(MemoryStorage::new());
        let persistence = Persistence::new(
            engine.clone(),
            "app",
            Some(vec!["count".to_string(), "missing".to_string()]),
        );

        persistence
            .persist(&Snapshot::from(json!({ "count": 2, "secret": "x" })))
            .unwrap();
        assert_eq!(engine.load("app").unwrap(), Some(json!({ "count": 2 })));
    }

    #[test]
    fn test_rehydrate_respects_allow_list() {
        let engine = Arc::new(
            MemoryStorage::with_blob("app", &json!({ "count": 5, "secret": "x" })).unwrap(),
        );
        let persistence = Persistence::new(engine, "app", Some(vec!["count".to_string()]));

        assert_eq!(persistence.rehydrate().unwrap(), Some(json!({ "count": 5 })));
    }

    #[test]
    fn test_empty_allow_list_persists_everything() {
        let engine = Arc::new(MemoryStorage::new());
        let persistence = Persistence::new(engine.clone(), "app", Some(Vec::new()));

        persistence
            .persist(&Snapshot::from(json!({ "a": 1, "b": 2 })))
            .unwrap();
        assert_eq!(engine.load("app").unwrap(), Some(json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn test_rehydrate_without_blob() {
        let persistence = Persistence::new(Arc::new(MemoryStorage::new()), "app", None);
        assert_eq!(persistence.rehydrate().unwrap(), None);
    }

    #[test]
    fn test_remove_slice_and_clear() {
        let engine = Arc::new(MemoryStorage::with_blob("app", &json!({ "a": 1, "b": 2 })).unwrap());
        let persistence = Persistence::new(engine.clone(), "app", None);

        persistence.remove_slice("a").unwrap();
        assert_eq!(engine.load("app").unwrap(), Some(json!({ "b": 2 })));

        persistence.clear().unwrap();
        assert_eq!(engine.load("app").unwrap(), None);
    }
}
