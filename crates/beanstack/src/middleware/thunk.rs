//! Thunk middleware - runs deferred actions instead of forwarding them

use super::{DispatchFn, Dispatched, Middleware, StoreApi};
use crate::action::AnyAction;
use crate::error::StoreResult;

/// Invokes synchronous thunks with the store API and returns their result
///
/// Plain and async actions are forwarded unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThunkMiddleware;

impl Middleware for ThunkMiddleware {
    fn handle(
        &self,
        action: AnyAction,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        match action {
            AnyAction::Thunk(thunk) => thunk(api).map(Dispatched::Ready),
            other => next(other),
        }
    }
}

/// Starts async thunks and returns [`Dispatched::Pending`]
///
/// The store lock is never held while the thunk is suspended; every action
/// the thunk dispatches commits synchronously on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsyncThunkMiddleware;

impl Middleware for AsyncThunkMiddleware {
    fn handle(
        &self,
        action: AnyAction,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        match action {
            AnyAction::AsyncThunk(thunk) => Ok(Dispatched::Pending(thunk(api.clone()))),
            other => next(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::middleware;
    use crate::reducer;
    use crate::{Action, AnyAction, Store, StoreError};
    use serde_json::{Value, json};

    fn counter_store(middleware: Vec<std::sync::Arc<dyn middleware::Middleware>>) -> Store {
        Store::builder(reducer::from_fn(|state, action| {
            let mut state = state.unwrap_or_else(|| json!({}));
            if action.action_type == "ADD" {
                let by = action.payload.as_ref().and_then(Value::as_i64).unwrap_or(1);
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + by);
            }
            Ok(state)
        }))
        .initial_state(json!({ "count": 0 }))
        .apply_middleware(middleware)
        .build()
        .unwrap()
    }

    #[test]
    fn test_thunk_receives_dispatch_and_state() {
        let store = counter_store(vec![middleware::thunk()]);

        let result = store
            .dispatch(AnyAction::thunk(|api| {
                api.dispatch(Action::with_payload("ADD", json!(2)))?;
                api.dispatch(Action::with_payload("ADD", json!(3)))?;
                Ok(api.get_slice("count")?)
            }))
            .unwrap();

        assert_eq!(result.into_value(), Some(json!(5)));
        assert_eq!(store.get_state(), json!({ "count": 5 }));
    }

    #[test]
    fn test_plain_actions_pass_through_thunk_middleware() {
        let store = counter_store(vec![middleware::thunk()]);
        let result = store.dispatch(Action::new("ADD")).unwrap();

        assert_eq!(result.value(), Some(&json!({ "type": "ADD" })));
        assert_eq!(store.get_state(), json!({ "count": 1 }));
    }

    #[test]
    fn test_thunk_without_middleware_is_rejected() {
        let store = counter_store(Vec::new());
        let err = store
            .dispatch(AnyAction::thunk(|_api| Ok(None)))
            .unwrap_err();

        assert!(matches!(err, StoreError::MalformedAction(_)));
        assert_eq!(store.get_state(), json!({ "count": 0 }));
    }

    #[test]
    fn test_thunk_error_propagates() {
        let store = counter_store(vec![middleware::thunk()]);
        let err = store
            .dispatch(AnyAction::thunk(|_api| {
                Err(StoreError::middleware("lookup failed"))
            }))
            .unwrap_err();

        assert_eq!(err.to_string(), "Middleware error: lookup failed");
    }

    #[tokio::test]
    async fn test_async_thunk_is_awaited_by_caller() {
        let store = counter_store(vec![middleware::async_thunk(), middleware::thunk()]);

        let pending = store
            .dispatch(AnyAction::async_thunk(|api| async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                api.dispatch(Action::with_payload("ADD", json!(10)))?;
                Ok::<_, StoreError>(Some(json!("synced")))
            }))
            .unwrap();
        assert!(pending.is_pending());
        assert_eq!(store.get_state(), json!({ "count": 0 }));

        let result = pending.settle().await.unwrap();
        assert_eq!(result, Some(json!("synced")));
        assert_eq!(store.get_state(), json!({ "count": 10 }));
    }

    #[tokio::test]
    async fn test_async_middleware_forwards_sync_thunks() {
        let store = counter_store(vec![middleware::async_thunk(), middleware::thunk()]);

        let result = store
            .dispatch(AnyAction::thunk(|api| {
                api.dispatch(Action::new("ADD"))?;
                Ok(None)
            }))
            .unwrap()
            .settle()
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(store.get_state(), json!({ "count": 1 }));
    }
}
