//! Thread-safe, Redux-style application state container
//!
//! This crate provides:
//! - A frozen, value-comparable state tree ([`Snapshot`])
//! - A store that serializes every transition under one reentrant lock ([`Store`])
//! - A bounded history of past states for time-travel debugging ([`History`])
//! - A middleware pipeline with thunks, logging, error boundary and debounce
//! - Pluggable persistence of the whole state or an allow-list of keys
//!
//! ```text
//! caller → middleware chain → base dispatch → reducer → snapshot → history → storage → subscribers
//! ```
//!
//! # Example
//!
//! ```rust
//! use beanstack::{reducer, Action, Store};
//! use serde_json::json;
//!
//! let store = Store::builder(reducer::from_fn(|state, action| {
//!     let mut state = state.unwrap_or_else(|| json!({}));
//!     if action.action_type == "INCREMENT" {
//!         let count = state["count"].as_i64().unwrap_or(0);
//!         state["count"] = json!(count + 1);
//!     }
//!     Ok(state)
//! }))
//! .initial_state(json!({ "count": 0 }))
//! .build()?;
//!
//! store.dispatch(Action::new("INCREMENT"))?;
//! assert_eq!(store.get_state(), json!({ "count": 1 }));
//! # Ok::<(), beanstack::StoreError>(())
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod history;
pub mod middleware;
pub mod persistence;
pub mod reducer;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod subscriber;

pub use action::{Action, ActionTypes, AnyAction};
pub use config::StoreOptions;
pub use error::{BoxError, StoreError, StoreResult};
pub use history::{History, HistoryEntry, HistoryRecord, DEFAULT_HISTORY_CAPACITY};
pub use middleware::{
    ActionMiddleware, AsyncThunkMiddleware, BoxFuture, Debounce, DispatchFn, Dispatched,
    ErrorBoundary, Guarded, LoggerMiddleware, Middleware, StoreApi, ThunkMiddleware,
};
pub use reducer::{combine_reducers, CombinedReducer, Reducer, ReducerResult};
pub use snapshot::Snapshot;
pub use storage::{MemoryStorage, StorageEngine, StorageError};
pub use store::{create_store, Store, StoreBuilder};
pub use subscriber::{Redraw, Subscriber, Subscription};
