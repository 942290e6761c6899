//! State change subscribers

use crate::store::StoreCore;
use std::fmt;
use std::sync::{Arc, Weak};

/// Something that can re-render itself when the state changes
pub trait Redraw: Send + Sync {
    fn redraw(&self);
}

/// A registered listener, notified after every commit and time-travel jump
///
/// Membership is by identity: clones of the same subscriber are the same
/// listener, two separately created closures never are.
#[derive(Clone)]
pub enum Subscriber {
    Callback(Arc<dyn Fn() + Send + Sync>),
    Observer(Arc<dyn Redraw>),
}

impl Subscriber {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Subscriber::Callback(Arc::new(f))
    }

    pub fn observer(observer: Arc<dyn Redraw>) -> Self {
        Subscriber::Observer(observer)
    }

    pub(crate) fn notify(&self) {
        match self {
            Subscriber::Callback(callback) => callback(),
            Subscriber::Observer(observer) => observer.redraw(),
        }
    }

    /// Identity comparison
    pub fn same_as(&self, other: &Subscriber) -> bool {
        match (self, other) {
            (Subscriber::Callback(a), Subscriber::Callback(b)) => Arc::ptr_eq(a, b),
            (Subscriber::Observer(a), Subscriber::Observer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscriber::Callback(_) => f.write_str("Subscriber::Callback"),
            Subscriber::Observer(_) => f.write_str("Subscriber::Observer"),
        }
    }
}

/// Handle returned by `Store::subscribe`
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription does not unsubscribe; keep it to unsubscribe later"]
pub struct Subscription {
    core: Weak<StoreCore>,
    subscriber: Subscriber,
}

impl Subscription {
    pub(crate) fn new(core: Weak<StoreCore>, subscriber: Subscriber) -> Self {
        Self { core, subscriber }
    }

    /// Remove the first matching registration; returns whether one was removed
    pub fn unsubscribe(self) -> bool {
        match self.core.upgrade() {
            Some(core) => core.unsubscribe(&self.subscriber),
            None => false,
        }
    }
}
