//! Bounded state history for time-travel debugging
//!
//! Entries are appended in commit order. Pushing while the cursor sits behind
//! the tail first drops everything after the cursor (undo/redo branching), and
//! once the ring is full the oldest entry is evicted silently.
//!
//! The ring carries its own lock so it can be inspected directly, outside of
//! a dispatch. It knows nothing about reducers or subscribers. Only the store
//! writes to it; everyone else gets the read side.
//!
//! ```compile_fail
//! use beanstack::{Action, History, Snapshot};
//!
//! let history = History::default();
//! history.push(Snapshot::Null, Action::new("FORGED"));
//! ```

use crate::action::Action;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of entries retained unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One committed transition
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub state: Snapshot,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

/// Inspection view of an entry, without its state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub index: usize,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
    pub is_current: bool,
}

#[derive(Debug)]
struct Ring {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    /// Always `None` for an empty ring, otherwise a valid index
    cursor: Option<usize>,
}

/// Fixed-capacity history of past states with a cursor
#[derive(Debug)]
pub struct History {
    ring: Mutex<Ring>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                entries: VecDeque::with_capacity(capacity),
                capacity,
                cursor: None,
            }),
        }
    }

    /// Record `state` as produced by `action` and move the cursor to it
    pub(crate) fn push(&self, state: Snapshot, action: Action) {
        let mut ring = self.ring.lock();

        if let Some(cursor) = ring.cursor {
            ring.entries.truncate(cursor + 1);
        }

        ring.entries.push_back(HistoryEntry {
            state,
            action,
            timestamp: Utc::now(),
        });
        if ring.entries.len() > ring.capacity {
            ring.entries.pop_front();
        }
        ring.cursor = Some(ring.entries.len() - 1);
    }

    /// State stored at `index`, if retained
    pub fn get(&self, index: usize) -> Option<Snapshot> {
        self.ring
            .lock()
            .entries
            .get(index)
            .map(|entry| entry.state.clone())
    }

    /// State under the cursor
    pub fn current(&self) -> Option<Snapshot> {
        let ring = self.ring.lock();
        ring.cursor
            .and_then(|cursor| ring.entries.get(cursor))
            .map(|entry| entry.state.clone())
    }

    /// Move the cursor to `index`; returns the state there, or `None` if not retained
    pub(crate) fn travel_to(&self, index: usize) -> Option<Snapshot> {
        let mut ring = self.ring.lock();
        let state = ring.entries.get(index).map(|entry| entry.state.clone())?;
        ring.cursor = Some(index);
        Some(state)
    }

    /// All retained entries in chronological order
    pub fn list_entries(&self) -> Vec<HistoryRecord> {
        let ring = self.ring.lock();
        ring.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| HistoryRecord {
                index,
                action: entry.action.clone(),
                timestamp: entry.timestamp,
                is_current: ring.cursor == Some(index),
            })
            .collect()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.ring.lock().cursor
    }

    pub fn len(&self) -> usize {
        self.ring.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity
    }
}
