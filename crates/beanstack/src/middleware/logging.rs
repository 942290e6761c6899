//! Logging middleware - reports every plain action with timing

use super::{ActionMiddleware, DispatchFn, Dispatched, StoreApi};
use crate::action::Action;
use crate::error::StoreResult;
use serde_json::Value;
use std::time::Instant;

/// Logs type, payload, state before/after and elapsed time of each action
///
/// Purely observational: the action and the result are passed through as-is,
/// including errors.
#[derive(Debug, Default, Clone)]
pub struct LoggerMiddleware {
    level: Option<log::Level>,
}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self { level: None }
    }

    /// Log at `level` instead of `Info`
    pub fn with_level(level: log::Level) -> Self {
        Self { level: Some(level) }
    }

    fn level(&self) -> log::Level {
        self.level.unwrap_or(log::Level::Info)
    }
}

fn render(state: Option<Value>) -> String {
    state.map_or_else(|| "<unavailable>".to_string(), |state| state.to_string())
}

impl ActionMiddleware for LoggerMiddleware {
    fn handle_action(
        &self,
        action: Action,
        api: &StoreApi,
        next: &DispatchFn,
    ) -> StoreResult<Dispatched> {
        let level = self.level();
        if !log::log_enabled!(level) {
            return next(action.into());
        }

        let action_type = action.action_type.clone();
        let payload = action.payload.clone().unwrap_or(Value::Null);
        let prev_state = api.get_state().ok();
        let start = Instant::now();

        let result = next(action.into());

        let elapsed = start.elapsed();
        let next_state = api.get_state().ok();
        log::log!(level, "Action: {}", action_type);
        log::log!(level, "  payload: {}", payload);
        log::log!(level, "  prev state: {}", render(prev_state));
        log::log!(level, "  next state: {}", render(next_state));
        log::log!(
            level,
            "  took {:.3}ms{}",
            elapsed.as_secs_f64() * 1000.0,
            if result.is_err() { " (failed)" } else { "" }
        );

        result
    }
}
