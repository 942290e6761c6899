//! Store - holds application state and runs the dispatch loop
//!
//! Every transition (reduce, history push, persist, notify) runs on the calling
//! thread inside one reentrant critical section, so a reducer, middleware or
//! subscriber may call back into the store from that thread. The `RefCell`
//! borrow is never held while caller code runs.

use crate::action::{Action, ActionTypes, AnyAction};
use crate::config::StoreOptions;
use crate::error::{StoreError, StoreResult};
use crate::history::{History, HistoryRecord};
use crate::middleware::{self, DispatchFn, Dispatched, Middleware, StoreApi};
use crate::persistence::{merge_state, Persistence};
use crate::reducer::Reducer;
use crate::snapshot::Snapshot;
use crate::storage::StorageEngine;
use crate::subscriber::{Subscriber, Subscription};
use parking_lot::ReentrantMutex;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, OnceLock};

struct Inner {
    state: Snapshot,
    subscribers: Vec<Subscriber>,
    debug_mode: bool,
}

/// Shared core of a [`Store`]; middleware reaches it through a weak handle
pub(crate) struct StoreCore {
    inner: ReentrantMutex<RefCell<Inner>>,
    history: History,
    reducer: Arc<dyn Reducer>,
    persistence: Option<Persistence>,
    /// Composed middleware chain, set once
    dispatch: OnceLock<DispatchFn>,
}

impl StoreCore {
    /// Top of the chain: composed middleware if applied, else the base dispatch
    pub(crate) fn dispatch(&self, action: AnyAction) -> StoreResult<Dispatched> {
        match self.dispatch.get() {
            Some(chain) => chain(action),
            None => self.base_dispatch(action),
        }
    }

    fn base_dispatch(&self, action: AnyAction) -> StoreResult<Dispatched> {
        let action = match action {
            AnyAction::Plain(action) => action,
            deferred => {
                return Err(StoreError::MalformedAction(format!(
                    "{deferred:?} reached the reducer; install the thunk middleware to dispatch deferred actions"
                )));
            }
        };
        action.validate()?;

        let guard = self.inner.lock();
        let current = guard.borrow().state.to_value();

        log::debug!("Reducing action {}", action.action_type);
        let next = self
            .reducer
            .reduce(Some(current), &action)
            .map_err(|source| StoreError::Reducer {
                action_type: action.action_type.clone(),
                source,
            })?;
        let next = mapping_snapshot(next, "reducer output")?;

        let (subscribers, debug_mode) = {
            let mut inner = guard.borrow_mut();
            inner.state = next.clone();
            (inner.subscribers.clone(), inner.debug_mode)
        };

        if debug_mode {
            self.history.push(next.clone(), action.clone());
        }
        if let Some(persistence) = &self.persistence {
            persistence.persist(&next)?;
        }
        notify(&subscribers);

        Ok(Dispatched::Ready(Some(action.to_value())))
    }

    /// Live state, or the history cursor in debug mode
    fn visible_state(&self) -> Snapshot {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        if inner.debug_mode {
            if let Some(state) = self.history.current() {
                return state;
            }
        }
        inner.state.clone()
    }

    pub(crate) fn get_state(&self) -> Value {
        self.visible_state().to_value()
    }

    pub(crate) fn get_slice(&self, key: &str) -> Option<Value> {
        self.visible_state().get(key).map(Snapshot::to_value)
    }

    fn subscribe(&self, subscriber: Subscriber) {
        let guard = self.inner.lock();
        guard.borrow_mut().subscribers.push(subscriber);
    }

    /// Remove the first registration of `subscriber`
    pub(crate) fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        match inner.subscribers.iter().position(|s| s.same_as(subscriber)) {
            Some(position) => {
                inner.subscribers.remove(position);
                true
            }
            None => false,
        }
    }

    fn subscribers(&self) -> Vec<Subscriber> {
        self.inner.lock().borrow().subscribers.clone()
    }
}

fn notify(subscribers: &[Subscriber]) {
    for subscriber in subscribers {
        subscriber.notify();
    }
}

/// Wrap `value` as a snapshot, rejecting anything but a mapping
fn mapping_snapshot(value: Value, what: &str) -> StoreResult<Snapshot> {
    if !value.is_object() {
        return Err(StoreError::InvalidState(format!(
            "{what} must be a mapping, got {value}"
        )));
    }
    Ok(Snapshot::from(value))
}

/// Compose `middleware` around the base dispatch of `core` and announce it
fn enhance(core: &Arc<StoreCore>, middleware: &[Arc<dyn Middleware>]) -> StoreResult<()> {
    if middleware.is_empty() {
        return Ok(());
    }
    if core.dispatch.get().is_some() {
        return Err(StoreError::AlreadyEnhanced);
    }

    let api = StoreApi::new(Arc::downgrade(core));
    let weak = Arc::downgrade(core);
    let base: DispatchFn = Arc::new(move |action: AnyAction| match weak.upgrade() {
        Some(core) => core.base_dispatch(action),
        None => Err(StoreError::StoreDropped),
    });

    let chain = middleware::compose(middleware, &api, base);
    core.dispatch
        .set(chain)
        .map_err(|_| StoreError::AlreadyEnhanced)?;
    log::debug!("Applied {} middleware", middleware.len());

    core.dispatch(Action::new(ActionTypes::INIT).into())?;
    Ok(())
}

/// Thread-safe state container
///
/// Cloning a `Store` yields another handle to the same state.
#[derive(Clone)]
pub struct Store {
    core: Arc<StoreCore>,
}

impl Store {
    pub fn builder<R: Reducer + 'static>(reducer: R) -> StoreBuilder {
        StoreBuilder::new(Arc::new(reducer))
    }

    /// Dispatch through the middleware chain
    ///
    /// Returns the committed action for plain actions, whatever a thunk
    /// returned for deferred ones, and `Ready(None)` if middleware dropped it.
    pub fn dispatch(&self, action: impl Into<AnyAction>) -> StoreResult<Dispatched> {
        self.core.dispatch(action.into())
    }

    /// Dispatch a raw value; it must be a mapping with a string `type`
    pub fn dispatch_value(&self, action: Value) -> StoreResult<Dispatched> {
        self.dispatch(AnyAction::try_from(action)?)
    }

    /// Apply middleware after construction
    ///
    /// Fails with [`StoreError::AlreadyEnhanced`] if a chain is already in place.
    pub fn apply_middleware<I>(&self, middleware: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let middleware: Vec<_> = middleware.into_iter().collect();
        enhance(&self.core, &middleware)
    }

    /// Independent copy of the whole state
    pub fn get_state(&self) -> Value {
        self.core.get_state()
    }

    /// Independent copy of one top-level slice
    pub fn get_slice(&self, key: &str) -> Option<Value> {
        self.core.get_slice(key)
    }

    /// Frozen handle to the visible state; cheap to clone and compare
    pub fn snapshot(&self) -> Snapshot {
        self.core.visible_state()
    }

    pub fn subscribe(&self, subscriber: Subscriber) -> Subscription {
        self.core.subscribe(subscriber.clone());
        Subscription::new(Arc::downgrade(&self.core), subscriber)
    }

    pub fn subscribe_fn<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(Subscriber::callback(callback))
    }

    /// Remove the first registration of `subscriber`; returns whether one was found
    pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
        self.core.unsubscribe(subscriber)
    }

    /// Start recording history; seeds it with the current state as `@@INIT`
    pub fn enable_debug(&self) {
        let guard = self.core.inner.lock();
        let mut inner = guard.borrow_mut();
        if inner.debug_mode {
            return;
        }
        inner.debug_mode = true;

        // Re-enabling after state moved on must not resurface a stale cursor
        if self.core.history.current().as_ref() != Some(&inner.state) {
            self.core
                .history
                .push(inner.state.clone(), Action::new(ActionTypes::HISTORY_INIT));
        }
        log::debug!("Debug mode enabled ({} history entries)", self.core.history.len());
    }

    /// Stop recording; the state under the history cursor becomes the live state
    pub fn disable_debug(&self) -> StoreResult<()> {
        let guard = self.core.inner.lock();
        let committed = {
            let mut inner = guard.borrow_mut();
            if !inner.debug_mode {
                return Ok(());
            }
            inner.debug_mode = false;
            let committed = self.core.history.current();
            if let Some(state) = &committed {
                inner.state = state.clone();
            }
            committed
        };
        log::debug!("Debug mode disabled");

        if let (Some(state), Some(persistence)) = (committed, &self.core.persistence) {
            persistence.persist(&state)?;
        }
        Ok(())
    }

    pub fn is_debug(&self) -> bool {
        self.core.inner.lock().borrow().debug_mode
    }

    /// Move the history cursor and re-notify subscribers
    ///
    /// The reducer is not re-run and the live state is untouched until
    /// [`Store::disable_debug`].
    pub fn time_travel_to(&self, index: usize) -> StoreResult<()> {
        let _guard = self.core.inner.lock();
        if !self.is_debug() {
            return Err(StoreError::DebugModeRequired("time_travel_to"));
        }
        if self.core.history.travel_to(index).is_none() {
            return Err(StoreError::HistoryIndexOutOfRange {
                index,
                len: self.core.history.len(),
            });
        }
        log::debug!("Time travelled to history entry {}", index);

        notify(&self.core.subscribers());
        Ok(())
    }

    /// Recorded actions, oldest first
    pub fn get_history(&self) -> StoreResult<Vec<HistoryRecord>> {
        if !self.is_debug() {
            return Err(StoreError::DebugModeRequired("get_history"));
        }
        Ok(self.core.history.list_entries())
    }

    /// Read access to the history ring; only dispatch and time travel move it
    pub fn history(&self) -> &History {
        &self.core.history
    }

    /// Delete one top-level field from the persisted blob
    pub fn remove_persisted_slice(&self, key: &str) -> StoreResult<()> {
        match &self.core.persistence {
            Some(persistence) => persistence.remove_slice(key),
            None => Ok(()),
        }
    }

    /// Delete the whole persisted blob
    pub fn clear_persisted_state(&self) -> StoreResult<()> {
        match &self.core.persistence {
            Some(persistence) => persistence.clear(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.snapshot())
            .field("debug_mode", &self.is_debug())
            .field("enhanced", &self.core.dispatch.get().is_some())
            .finish()
    }
}

/// Builder for [`Store`]
pub struct StoreBuilder {
    reducer: Arc<dyn Reducer>,
    initial_state: Option<Value>,
    storage: Option<Arc<dyn StorageEngine>>,
    options: StoreOptions,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl StoreBuilder {
    fn new(reducer: Arc<dyn Reducer>) -> Self {
        Self {
            reducer,
            initial_state: None,
            storage: None,
            options: StoreOptions::default(),
            middleware: Vec::new(),
        }
    }

    /// Must be a mapping; defaults to `{}`
    pub fn initial_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn storage(mut self, engine: Arc<dyn StorageEngine>) -> Self {
        self.storage = Some(engine);
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.options.storage_key = key.into();
        self
    }

    pub fn persist_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.options.persist_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.options.history_capacity = capacity;
        self
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Middleware in registration order; the first one is outermost
    pub fn apply_middleware<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        self.middleware.extend(middleware);
        self
    }

    /// Rehydrate, compose middleware and dispatch the startup action
    pub fn build(self) -> StoreResult<Store> {
        let persistence = self.storage.map(|engine| {
            Persistence::new(
                engine,
                self.options.storage_key.clone(),
                self.options.persist_keys.clone(),
            )
        });

        let initial = self
            .initial_state
            .unwrap_or_else(|| Value::Object(Default::default()));
        let initial = mapping_snapshot(initial, "initial state")?.to_value();
        let state = match persistence.as_ref().map(Persistence::rehydrate).transpose()? {
            Some(Some(stored)) => merge_state(initial, stored),
            _ => initial,
        };
        let state = mapping_snapshot(state, "rehydrated state")?;

        let core = Arc::new(StoreCore {
            inner: ReentrantMutex::new(RefCell::new(Inner {
                state,
                subscribers: Vec::new(),
                debug_mode: false,
            })),
            history: History::new(self.options.history_capacity),
            reducer: self.reducer,
            persistence,
            dispatch: OnceLock::new(),
        });
        enhance(&core, &self.middleware)?;

        Ok(Store { core })
    }
}

/// Store with no persistence and no middleware
pub fn create_store<R: Reducer + 'static>(reducer: R, initial_state: Value) -> StoreResult<Store> {
    Store::builder(reducer).initial_state(initial_state).build()
}
