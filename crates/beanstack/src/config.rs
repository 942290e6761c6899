//! Store options

use crate::history::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};

/// Options controlling persistence and debugging of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Key the state blob is saved under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Top-level keys to persist; `None` or empty persists the whole state
    #[serde(default)]
    pub persist_keys: Option<Vec<String>>,

    /// Maximum number of history entries kept in debug mode
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_storage_key() -> String {
    "beanstack_state".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            persist_keys: None,
            history_capacity: default_history_capacity(),
        }
    }
}
