//! Reducers - pure functions producing new state from old state + action

use crate::action::Action;
use crate::error::BoxError;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Result of running a reducer
pub type ReducerResult = Result<Value, BoxError>;

/// Pure state transition `(state_or_absent, action) -> new_state`
///
/// The store always passes `Some(state)`; slices under [`CombinedReducer`]
/// receive `None` when their key is absent from the previous state.
pub trait Reducer: Send + Sync {
    fn reduce(&self, state: Option<Value>, action: &Action) -> ReducerResult;
}

impl<F> Reducer for F
where
    F: Fn(Option<Value>, &Action) -> ReducerResult + Send + Sync,
{
    fn reduce(&self, state: Option<Value>, action: &Action) -> ReducerResult {
        self(state, action)
    }
}

/// Pin a closure's signature so it can be used as a [`Reducer`]
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(Option<Value>, &Action) -> ReducerResult + Send + Sync,
{
    f
}

/// Reducer assembled from one sub-reducer per top-level key
///
/// Every registered sub-reducer sees the same action; keys without a reducer
/// are dropped from the resulting state.
#[derive(Clone, Default)]
pub struct CombinedReducer {
    slices: Vec<(String, Arc<dyn Reducer>)>,
}

impl CombinedReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `reducer` for the top-level `key`, replacing any earlier one
    pub fn slice<R: Reducer + 'static>(mut self, key: impl Into<String>, reducer: R) -> Self {
        self.insert(key.into(), Arc::new(reducer));
        self
    }

    fn insert(&mut self, key: String, reducer: Arc<dyn Reducer>) {
        match self.slices.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = reducer,
            None => self.slices.push((key, reducer)),
        }
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(key, _)| key.as_str())
    }
}

impl Reducer for CombinedReducer {
    fn reduce(&self, state: Option<Value>, action: &Action) -> ReducerResult {
        let mut previous = match state {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut next = Map::new();
        for (key, reducer) in &self.slices {
            let slice = reducer.reduce(previous.remove(key), action)?;
            next.insert(key.clone(), slice);
        }
        Ok(Value::Object(next))
    }
}

/// Combine a set of `(key, reducer)` pairs into one [`CombinedReducer`]
pub fn combine_reducers<I, K>(reducers: I) -> CombinedReducer
where
    I: IntoIterator<Item = (K, Arc<dyn Reducer>)>,
    K: Into<String>,
{
    let mut combined = CombinedReducer::new();
    for (key, reducer) in reducers {
        combined.insert(key.into(), reducer);
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_one() -> impl Reducer {
        from_fn(|state, _action| {
            let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
            Ok(json!(n + 1))
        })
    }

    fn times_ten() -> impl Reducer {
        from_fn(|state, _action| {
            let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
            Ok(json!(n * 10))
        })
    }

    #[test]
    fn test_each_slice_gets_its_own_state() {
        let a: Arc<dyn Reducer> = Arc::new(add_one());
        let b: Arc<dyn Reducer> = Arc::new(times_ten());
        let reducer = combine_reducers([("a", a), ("b", b)]);

        let next = reducer
            .reduce(Some(json!({ "a": 1, "b": 2 })), &Action::new("T"))
            .unwrap();
        assert_eq!(next, json!({ "a": 2, "b": 20 }));
    }

    #[test]
    fn test_unregistered_keys_are_dropped() {
        let reducer = CombinedReducer::new().slice("a", add_one());

        let next = reducer
            .reduce(Some(json!({ "a": 1, "stale": true })), &Action::new("T"))
            .unwrap();
        assert_eq!(next, json!({ "a": 2 }));
    }

    #[test]
    fn test_absent_slice_receives_none() {
        let reducer = CombinedReducer::new().slice(
            "todos",
            from_fn(|state, _action| {
                assert!(state.is_none());
                Ok(json!([]))
            }),
        );

        let next = reducer.reduce(None, &Action::new("T")).unwrap();
        assert_eq!(next, json!({ "todos": [] }));
    }

    #[test]
    fn test_all_slices_see_the_same_action() {
        let echo = || {
            from_fn(|_state, action: &Action| Ok(json!(action.action_type.clone())))
        };
        let reducer = CombinedReducer::new().slice("x", echo()).slice("y", echo());

        let next = reducer.reduce(Some(json!({})), &Action::new("PING")).unwrap();
        assert_eq!(next, json!({ "x": "PING", "y": "PING" }));
    }

    #[test]
    fn test_slice_failure_propagates() {
        let reducer = CombinedReducer::new().slice(
            "bad",
            from_fn(|_state, _action| Err("bad slice".into())),
        );

        let err = reducer.reduce(None, &Action::new("T")).unwrap_err();
        assert_eq!(err.to_string(), "bad slice");
    }

    #[test]
    fn test_re_registering_a_key_replaces_reducer() {
        let reducer = CombinedReducer::new()
            .slice("a", add_one())
            .slice("a", times_ten());

        assert_eq!(reducer.keys().collect::<Vec<_>>(), vec!["a"]);
        let next = reducer.reduce(Some(json!({ "a": 3 })), &Action::new("T")).unwrap();
        assert_eq!(next, json!({ "a": 30 }));
    }
}
