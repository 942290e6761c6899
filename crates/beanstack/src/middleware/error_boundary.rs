//! Error boundary - reports failing actions, never swallows them

use super::{ActionMiddleware, DispatchFn, Dispatched, StoreApi};
use crate::action::{Action, ActionTypes};
use crate::error::StoreResult;
use std::backtrace::Backtrace;

/// On failure: log, dispatch an `ERROR` action from the top of the chain,
/// then return the original error
///
/// A failing `ERROR` action is logged and re-raised but not reported again.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorBoundary;

impl ErrorBoundary {
    pub fn new() -> Self {
        Self
    }
}

impl ActionMiddleware for ErrorBoundary {
    fn handle_action(
        &self,
        action: Action,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        // `next` consumes the action; keep a copy for the report
        let failed = action.clone();
        let err = match next(action.into()) {
            Ok(dispatched) => return Ok(dispatched),
            Err(err) => err,
        };

        log::error!(
            "Error processing action {}: {}\n{}",
            failed.action_type,
            err,
            Backtrace::force_capture()
        );

        if failed.action_type != ActionTypes::ERROR {
            if let Err(report_err) = api.dispatch(Action::error(&failed, &err)) {
                log::error!(
                    "Failed to report error for action {}: {}",
                    failed.action_type,
                    report_err
                );
            }
        }

        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use crate::middleware;
    use crate::reducer;
    use crate::{Action, ActionTypes, Store, StoreError};
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn recording_store(seen: Arc<Mutex<Vec<Action>>>, fail_errors: bool) -> Store {
        Store::builder(reducer::from_fn(move |state, action| {
            seen.lock().push(action.clone());
            match action.action_type.as_str() {
                "EXPLODE" => Err("kaboom".into()),
                ActionTypes::ERROR if fail_errors => Err("error handler broke".into()),
                _ => Ok(state.unwrap_or_else(|| json!({}))),
            }
        }))
        .initial_state(json!({ "ok": true }))
        .apply_middleware(vec![middleware::error_boundary()])
        .build()
        .unwrap()
    }

    #[test]
    fn test_failure_is_reported_and_reraised() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = recording_store(seen.clone(), false);
        seen.lock().clear();

        let err = store
            .dispatch(Action::with_payload("EXPLODE", json!(1)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Reducer { ref action_type, .. } if action_type == "EXPLODE"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].action_type, ActionTypes::ERROR);
        let payload = seen[1].payload.clone().unwrap_or(Value::Null);
        assert_eq!(payload["action"], json!({ "type": "EXPLODE", "payload": 1 }));
        assert_eq!(payload["error"], json!(err.to_string()));
    }

    #[test]
    fn test_failing_error_action_is_not_reported_again() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = recording_store(seen.clone(), true);
        seen.lock().clear();

        let err = store.dispatch(Action::new("EXPLODE")).unwrap_err();
        assert!(matches!(err, StoreError::Reducer { ref action_type, .. } if action_type == "EXPLODE"));

        let types: Vec<String> = seen.lock().iter().map(|a| a.action_type.clone()).collect();
        assert_eq!(types, vec!["EXPLODE", ActionTypes::ERROR]);
        assert_eq!(store.get_state(), json!({ "ok": true }));
    }

    #[test]
    fn test_success_passes_through() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = recording_store(seen.clone(), false);
        seen.lock().clear();

        let result = store.dispatch(Action::new("FINE")).unwrap();
        assert_eq!(result.value(), Some(&json!({ "type": "FINE" })));
        assert_eq!(seen.lock().len(), 1);
    }
}
