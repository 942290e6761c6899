//! Reducers of the counter application
//!
//! State shape:
//! ```text
//! { "counter": { "value": i64 }, "events": [ "<action type>", ... ] }
//! ```

use beanstack::{Action, CombinedReducer, ReducerResult};
use serde_json::{Value, json};

pub const INCREMENT: &str = "INCREMENT";
pub const DECREMENT: &str = "DECREMENT";
pub const ADD: &str = "ADD";
pub const RESET: &str = "RESET";

/// Most recent action types kept in the `events` slice
const MAX_EVENTS: usize = 10;

pub fn counter(state: Option<Value>, action: &Action) -> ReducerResult {
    let value = state
        .as_ref()
        .and_then(|s| s["value"].as_i64())
        .unwrap_or(0);

    let value = match action.action_type.as_str() {
        INCREMENT => value + 1,
        DECREMENT => value - 1,
        ADD => {
            let amount = action
                .payload
                .as_ref()
                .and_then(Value::as_i64)
                .ok_or_else(|| format!("{ADD} needs an integer payload"))?;
            value
                .checked_add(amount)
                .ok_or_else(|| format!("counter overflow adding {amount}"))?
        }
        RESET => 0,
        _ => return Ok(state.unwrap_or_else(|| json!({ "value": 0 }))),
    };
    Ok(json!({ "value": value }))
}

/// Ring of the last dispatched action types, startup actions excluded
pub fn events(state: Option<Value>, action: &Action) -> ReducerResult {
    let mut events = match state {
        Some(Value::Array(events)) => events,
        _ => Vec::new(),
    };
    if !action.action_type.starts_with("@@") {
        events.push(json!(action.action_type));
        if events.len() > MAX_EVENTS {
            events.drain(..events.len() - MAX_EVENTS);
        }
    }
    Ok(Value::Array(events))
}

pub fn root() -> CombinedReducer {
    CombinedReducer::new()
        .slice("counter", counter)
        .slice("events", events)
}

pub fn initial_state() -> Value {
    json!({ "counter": { "value": 0 }, "events": [] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstack::Reducer;

    #[test]
    fn test_counter_actions() {
        let state = Some(json!({ "value": 2 }));
        assert_eq!(
            counter(state.clone(), &Action::new(INCREMENT)).unwrap(),
            json!({ "value": 3 })
        );
        assert_eq!(
            counter(state.clone(), &Action::with_payload(ADD, json!(-5))).unwrap(),
            json!({ "value": -3 })
        );
        assert_eq!(
            counter(state.clone(), &Action::new(RESET)).unwrap(),
            json!({ "value": 0 })
        );
        assert_eq!(
            counter(state.clone(), &Action::new("UNRELATED")).unwrap(),
            json!({ "value": 2 })
        );
    }

    #[test]
    fn test_add_requires_integer_payload() {
        let err = counter(None, &Action::with_payload(ADD, json!("three"))).unwrap_err();
        assert!(err.to_string().contains("integer payload"));
    }

    #[test]
    fn test_events_keep_most_recent() {
        let mut state = None;
        for i in 0..12 {
            state = Some(events(state, &Action::new(format!("A{i}"))).unwrap());
        }
        let state = events(state, &Action::new("@@beanstack/INIT")).unwrap();

        let events = state.as_array().unwrap();
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(events[0], json!("A2"));
        assert_eq!(events[9], json!("A11"));
    }

    #[test]
    fn test_root_combines_slices() {
        let next = root()
            .reduce(Some(initial_state()), &Action::new(INCREMENT))
            .unwrap();
        assert_eq!(
            next,
            json!({ "counter": { "value": 1 }, "events": ["INCREMENT"] })
        );
    }
}
