//! Middleware system for the store
//!
//! Middleware sits between the public dispatch and the store's base dispatch,
//! allowing logging, deferred actions, error reporting and rate limiting to be
//! handled in a composable way.
//!
//! ## Design
//!
//! ```text
//! dispatch → M1 → M2 → … → base dispatch → reducer → state
//! ```
//!
//! Each middleware receives the action, the shared [`StoreApi`] and the next
//! link, and can:
//! - Pass the action through unchanged (`next(action)`)
//! - Transform it before passing it on
//! - Short-circuit by returning without calling `next`
//! - Dispatch additional actions through `api.dispatch`, which re-enter at the
//!   top of the chain, not at the next link
//!
//! The chain is a right fold over the registered list, so the first
//! middleware is outermost and the last sits closest to the reducer.
//!
//! ## Example
//!
//! ```rust
//! use beanstack::{middleware, AnyAction};
//!
//! let audit = middleware::from_fn(|action: AnyAction, _api, next| {
//!     log::debug!("Action: {:?}", action);
//!     next(action)
//! });
//! # let _ = audit;
//! ```

use crate::action::{Action, AnyAction};
use crate::error::StoreResult;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

mod api;
mod debounce;
mod error_boundary;
mod logging;
mod thunk;

pub use api::StoreApi;
pub use debounce::Debounce;
pub use error_boundary::ErrorBoundary;
pub use logging::LoggerMiddleware;
pub use thunk::{AsyncThunkMiddleware, ThunkMiddleware};

/// BoxFuture type alias for async thunks
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One link of the composed dispatch chain
pub type DispatchFn = Arc<dyn Fn(AnyAction) -> StoreResult<Dispatched> + Send + Sync>;

/// Outcome of a dispatch
pub enum Dispatched {
    /// Completed synchronously. Holds the committed action, a thunk's own
    /// result, or `None` when the action was dropped.
    Ready(Option<Value>),
    /// An async thunk is running; await [`Dispatched::settle`] for its result
    Pending(BoxFuture<'static, StoreResult<Option<Value>>>),
}

impl Dispatched {
    pub fn is_pending(&self) -> bool {
        matches!(self, Dispatched::Pending(_))
    }

    /// Result of a synchronous dispatch; `None` when dropped or still pending
    pub fn value(&self) -> Option<&Value> {
        match self {
            Dispatched::Ready(value) => value.as_ref(),
            Dispatched::Pending(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Dispatched::Ready(value) => value,
            Dispatched::Pending(_) => None,
        }
    }

    /// Wait for the dispatch to finish, whichever shape it had
    pub async fn settle(self) -> StoreResult<Option<Value>> {
        match self {
            Dispatched::Ready(value) => Ok(value),
            Dispatched::Pending(future) => future.await,
        }
    }
}

impl std::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatched::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Dispatched::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Middleware trait - intercepts anything dispatched before it reaches the reducer
///
/// - `action`: what was dispatched (plain or deferred)
/// - `api`: dispatch (top of chain) and state access
/// - `next`: the next link; not calling it short-circuits the action
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        action: AnyAction,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched>;
}

impl<F> Middleware for F
where
    F: Fn(AnyAction, &StoreApi, &DispatchFn) -> StoreResult<Dispatched> + Send + Sync,
{
    fn handle(
        &self,
        action: AnyAction,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        self(action, api, next)
    }
}

/// Wrap a closure as a shareable middleware
pub fn from_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(AnyAction, &StoreApi, &DispatchFn) -> StoreResult<Dispatched> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Middleware that only cares about plain actions
///
/// Register it through [`Guarded`] and deferred actions are forwarded to the
/// next link without ever reaching `handle_action`.
pub trait ActionMiddleware: Send + Sync {
    fn handle_action(
        &self,
        action: Action,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched>;
}

/// Type guard around an [`ActionMiddleware`]
pub struct Guarded<M>(pub M);

impl<M: ActionMiddleware> Guarded<M> {
    pub fn new(middleware: M) -> Self {
        Self(middleware)
    }
}

impl<M: ActionMiddleware> Middleware for Guarded<M> {
    fn handle(
        &self,
        action: AnyAction,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        match action {
            AnyAction::Plain(action) => self.0.handle_action(action, api, next),
            deferred => next(deferred),
        }
    }
}

/// Register an [`ActionMiddleware`] behind the type guard
pub fn guarded<M: ActionMiddleware + 'static>(middleware: M) -> Arc<dyn Middleware> {
    Arc::new(Guarded::new(middleware))
}

/// Logs every plain action with state before/after and timing
pub fn logger() -> Arc<dyn Middleware> {
    guarded(LoggerMiddleware::new())
}

/// Runs synchronous thunks instead of forwarding them
pub fn thunk() -> Arc<dyn Middleware> {
    Arc::new(ThunkMiddleware)
}

/// Starts async thunks and hands back their pending result
pub fn async_thunk() -> Arc<dyn Middleware> {
    Arc::new(AsyncThunkMiddleware)
}

/// Reports failing actions as `ERROR` actions, then re-raises
pub fn error_boundary() -> Arc<dyn Middleware> {
    guarded(ErrorBoundary::new())
}

/// Drops repeats of an action type arriving within `delay`
pub fn debounce(delay: std::time::Duration) -> Arc<dyn Middleware> {
    guarded(Debounce::new(delay))
}

/// Fold `middleware` around `base`, first registered outermost
pub(crate) fn compose(
    middleware: &[Arc<dyn Middleware>],
    api: &StoreApi,
    base: DispatchFn,
) -> DispatchFn {
    middleware.iter().rev().fold(base, |next, link| {
        let link = Arc::clone(link);
        let api = api.clone();
        let dispatch: DispatchFn =
            Arc::new(move |action: AnyAction| link.handle(action, &api, &next));
        dispatch
    })
}
