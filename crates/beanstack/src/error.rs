//! Error types surfaced by the store and its collaborators

use crate::storage::StorageError;
use thiserror::Error;

/// Error type used by caller-supplied code (reducers, middleware, thunks)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while building or driving a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The dispatched value is not a mapping with a `type` discriminator,
    /// or a deferred action reached the reducer.
    #[error("Malformed action: {0}")]
    MalformedAction(String),

    /// A state tree that must be a mapping was something else.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The reducer failed while handling an action.
    #[error("Reducer failed on action {action_type}: {source}")]
    Reducer {
        action_type: String,
        #[source]
        source: BoxError,
    },

    /// A time-travel operation was used outside debug mode.
    #[error("{0} is only available in debug mode")]
    DebugModeRequired(&'static str),

    /// `time_travel_to` was given an index that is not retained.
    #[error("History index {index} out of range (retained entries: {len})")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    /// The persistence backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A middleware or thunk reported a failure of its own.
    #[error("Middleware error: {0}")]
    Middleware(#[source] BoxError),

    /// A middleware API handle was used after its store was dropped.
    #[error("Store has been dropped")]
    StoreDropped,

    /// Middleware can only be applied once per store.
    #[error("Middleware has already been applied to this store")]
    AlreadyEnhanced,
}

impl StoreError {
    /// Wrap any failure raised by middleware or a thunk
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Self::Middleware(err.into())
    }
}
