//! Debounce - per action type minimum interval gate

use super::{ActionMiddleware, DispatchFn, Dispatched, StoreApi};
use crate::action::Action;
use crate::error::StoreResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Drops an action if one of the same type was accepted less than `delay` ago
///
/// A dropped action does not reset the clock, so a steady stream still gets
/// one action through per `delay`. The clock lives as long as the middleware.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Record `action_type` as accepted now unless it is still cooling down
    fn admit(&self, action_type: &str, now: Instant) -> bool {
        let mut last_accepted = self.last_accepted.lock();
        if let Some(last) = last_accepted.get(action_type) {
            if now.saturating_duration_since(*last) < self.delay {
                return false;
            }
        }
        last_accepted.insert(action_type.to_string(), now);
        true
    }
}

impl ActionMiddleware for Debounce {
    fn handle_action(
        &self,
        action: Action,
        _api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        if !self.admit(&action.action_type, Instant::now()) {
            log::warn!(
                "Debounced action {} (within {}ms)",
                action.action_type,
                self.delay.as_millis()
            );
            return Ok(Dispatched::Ready(None));
        }
        next(action.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware;
    use crate::reducer;
    use crate::Store;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_store(delay: Duration, notified: Arc<AtomicUsize>) -> Store {
        let store = Store::builder(reducer::from_fn(|state, action| {
            let mut state = state.unwrap_or_else(|| json!({}));
            let count = state["count"].as_i64().unwrap_or(0);
            if action.action_type == "X" || action.action_type == "Y" {
                state["count"] = json!(count + 1);
            }
            Ok(state)
        }))
        .initial_state(json!({ "count": 0 }))
        .apply_middleware(vec![middleware::debounce(delay)])
        .build()
        .unwrap();
        let _subscription = store.subscribe_fn(move || {
            notified.fetch_add(1, Ordering::SeqCst);
        });
        store
    }

    #[test]
    fn test_second_action_within_delay_is_dropped() {
        let notified = Arc::new(AtomicUsize::new(0));
        let store = counting_store(Duration::from_secs(60), notified.clone());

        assert!(store.dispatch(Action::new("X")).unwrap().value().is_some());
        let second = store.dispatch(Action::new("X")).unwrap();

        assert!(second.value().is_none());
        assert_eq!(store.get_state(), json!({ "count": 1 }));
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_types_are_debounced_independently() {
        let notified = Arc::new(AtomicUsize::new(0));
        let store = counting_store(Duration::from_secs(60), notified);

        store.dispatch(Action::new("X")).unwrap();
        store.dispatch(Action::new("Y")).unwrap();
        assert_eq!(store.get_state(), json!({ "count": 2 }));
    }

    #[test]
    fn test_actions_further_apart_than_delay_are_processed() {
        let notified = Arc::new(AtomicUsize::new(0));
        let store = counting_store(Duration::from_millis(20), notified.clone());

        store.dispatch(Action::new("X")).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        store.dispatch(Action::new("X")).unwrap();

        assert_eq!(store.get_state(), json!({ "count": 2 }));
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_action_does_not_reset_clock() {
        let debounce = Debounce::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(debounce.admit("X", start));
        assert!(!debounce.admit("X", start + Duration::from_millis(60)));
        assert!(debounce.admit("X", start + Duration::from_millis(110)));
        assert!(!debounce.admit("X", start + Duration::from_millis(150)));
    }
}
