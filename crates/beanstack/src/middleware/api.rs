//! Store API handed to middleware and thunks
//!
//! Anything dispatched through [`StoreApi::dispatch`] re-enters the middleware
//! chain from the beginning, so every middleware observes follow-up actions.
//! The handle resolves the store's dispatch lazily: it is created before the
//! chain exists and only looks the composed chain up when called.

use crate::action::AnyAction;
use crate::error::{StoreError, StoreResult};
use crate::middleware::Dispatched;
use crate::store::StoreCore;
use serde_json::Value;
use std::sync::{Arc, Weak};

/// `{dispatch, get_state}` shared by every middleware of one store
#[derive(Clone)]
pub struct StoreApi {
    core: Weak<StoreCore>,
}

impl StoreApi {
    pub(crate) fn new(core: Weak<StoreCore>) -> Self {
        Self { core }
    }

    fn core(&self) -> StoreResult<Arc<StoreCore>> {
        self.core.upgrade().ok_or(StoreError::StoreDropped)
    }

    /// Dispatch through the fully composed chain
    pub fn dispatch(&self, action: impl Into<AnyAction>) -> StoreResult<Dispatched> {
        self.core()?.dispatch(action.into())
    }

    /// Independent copy of the whole state
    pub fn get_state(&self) -> StoreResult<Value> {
        Ok(self.core()?.get_state())
    }

    /// Independent copy of one top-level slice
    pub fn get_slice(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.core()?.get_slice(key))
    }
}

impl std::fmt::Debug for StoreApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreApi")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}
