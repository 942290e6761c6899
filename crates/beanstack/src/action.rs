//! Actions - messages describing an intended state transition
//!
//! Plain actions are data (`{"type": ..., "payload": ...}`). Deferred actions
//! (thunks) are computations that receive the middleware API instead of reaching
//! the reducer; [`AnyAction`] keeps the three shapes apart at the type level so
//! no middleware needs to inspect what it was handed.

use crate::error::{StoreError, StoreResult};
use crate::middleware::{BoxFuture, StoreApi};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::future::Future;

/// Reserved action types
pub struct ActionTypes;

impl ActionTypes {
    /// Dispatched once through the full chain after middleware is applied
    pub const INIT: &'static str = "@@beanstack/INIT";
    /// Seeds the history when debug mode is switched on
    pub const HISTORY_INIT: &'static str = "@@INIT";
    /// Dispatched by the error boundary when an action fails
    pub const ERROR: &'static str = "ERROR";
}

/// A plain action: a `type` discriminator plus an optional payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Any other top-level keys (`meta`, `error`, ...), carried along untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            extra: Map::new(),
        }
    }

    pub fn with_payload(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Some(payload),
            extra: Map::new(),
        }
    }

    /// The `ERROR` action reported when `failed` could not be processed
    pub fn error(failed: &Action, error: &StoreError) -> Self {
        Self::with_payload(
            ActionTypes::ERROR,
            json!({
                "action": failed.to_value(),
                "error": error.to_string(),
            }),
        )
    }

    /// Check the discriminator invariant
    pub fn validate(&self) -> StoreResult<()> {
        if self.action_type.is_empty() {
            return Err(StoreError::MalformedAction(
                "action type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("type".to_string(), Value::String(self.action_type.clone()));
        if let Some(payload) = &self.payload {
            map.insert("payload".to_string(), payload.clone());
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for Action {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::MalformedAction(format!(
                    "actions must be mappings with a 'type' key, got {other}"
                )));
            }
        };
        let action_type = match map.remove("type") {
            Some(Value::String(action_type)) => action_type,
            Some(other) => {
                return Err(StoreError::MalformedAction(format!(
                    "action 'type' must be a string, got {other}"
                )));
            }
            None => {
                return Err(StoreError::MalformedAction(
                    "actions must be mappings with a 'type' key".to_string(),
                ));
            }
        };
        let payload = map.remove("payload");
        let action = Action {
            action_type,
            payload,
            extra: map,
        };
        action.validate()?;
        Ok(action)
    }
}

/// Synchronous deferred action
pub type Thunk = Box<dyn FnOnce(&StoreApi) -> StoreResult<Option<Value>> + Send>;

/// Asynchronous deferred action
pub type AsyncThunk =
    Box<dyn FnOnce(StoreApi) -> BoxFuture<'static, StoreResult<Option<Value>>> + Send>;

/// Anything that can be dispatched
pub enum AnyAction {
    Plain(Action),
    Thunk(Thunk),
    AsyncThunk(AsyncThunk),
}

impl AnyAction {
    /// Wrap a closure run by the thunk middleware with the store API
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(&StoreApi) -> StoreResult<Option<Value>> + Send + 'static,
    {
        AnyAction::Thunk(Box::new(f))
    }

    /// Wrap an async closure run by the async thunk middleware
    pub fn async_thunk<F, Fut>(f: F) -> Self
    where
        F: FnOnce(StoreApi) -> Fut + Send + 'static,
        Fut: Future<Output = StoreResult<Option<Value>>> + Send + 'static,
    {
        AnyAction::AsyncThunk(Box::new(
            move |api| -> BoxFuture<'static, StoreResult<Option<Value>>> { Box::pin(f(api)) },
        ))
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, AnyAction::Plain(_))
    }

    /// Discriminator of a plain action
    pub fn action_type(&self) -> Option<&str> {
        match self {
            AnyAction::Plain(action) => Some(&action.action_type),
            _ => None,
        }
    }
}

impl From<Action> for AnyAction {
    fn from(action: Action) -> Self {
        AnyAction::Plain(action)
    }
}

impl TryFrom<Value> for AnyAction {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Action::try_from(value).map(AnyAction::Plain)
    }
}

impl fmt::Debug for AnyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyAction::Plain(action) => f.debug_tuple("Plain").field(action).finish(),
            AnyAction::Thunk(_) => f.write_str("Thunk(..)"),
            AnyAction::AsyncThunk(_) => f.write_str("AsyncThunk(..)"),
        }
    }
}
