use anyhow::{Context, Result};
use beanstack::{middleware, Action, AnyAction, Redraw, Store, StoreError, Subscriber};
use beanstack_config::{open_storage, AppConfig};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod logger;
mod reducers;

use reducers::{ADD, DECREMENT, INCREMENT, RESET};

/// Prints the counter on every state change
struct Console {
    store: Store,
    frames: AtomicUsize,
}

impl Redraw for Console {
    fn redraw(&self) {
        let frame = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        let value = self
            .store
            .get_slice("counter")
            .and_then(|counter| counter["value"].as_i64())
            .unwrap_or_default();
        println!("[{frame:>3}] counter = {value}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = logger::init()?;
    log::info!("Starting beanstack-demo");

    let config = AppConfig::load();
    let storage = open_storage(&config.storage).context("Failed to open state storage")?;

    let store = Store::builder(reducers::root())
        .initial_state(reducers::initial_state())
        .options(config.store.clone())
        .storage(storage)
        .apply_middleware(vec![
            middleware::logger(),
            middleware::error_boundary(),
            middleware::debounce(config.debounce_delay()),
            middleware::async_thunk(),
            middleware::thunk(),
        ])
        .build()
        .context("Failed to create store")?;

    println!("Restored state: {}", store.get_state());

    // The console keeps a store handle; unsubscribed before exit
    let console = Arc::new(Console {
        store: store.clone(),
        frames: AtomicUsize::new(0),
    });
    let subscription = store.subscribe(Subscriber::observer(console));

    run(&store, config.debounce_delay()).await?;

    subscription.unsubscribe();
    println!("Final state: {}", store.get_state());
    println!("Log written to {}", log_file.display());
    log::info!("Exiting beanstack-demo");
    Ok(())
}

async fn run(store: &Store, debounce: Duration) -> Result<()> {
    store.dispatch(Action::new(INCREMENT))?;

    // Same type again inside the debounce window: dropped
    if store.dispatch(Action::new(INCREMENT))?.value().is_none() {
        println!("Second {INCREMENT} was debounced");
    }
    store.dispatch(Action::with_payload(ADD, json!(5)))?;

    // A reducer failure is reported as an ERROR action and still surfaces here
    tokio::time::sleep(debounce).await;
    if let Err(e) = store.dispatch(Action::with_payload(ADD, json!("lots"))) {
        println!("Rejected: {e}");
    }

    // Synchronous thunk reading state before deciding what to dispatch
    store.dispatch(AnyAction::thunk(|api| {
        let value = api
            .get_slice("counter")?
            .and_then(|counter| counter["value"].as_i64())
            .unwrap_or_default();
        if value > 3 {
            api.dispatch(Action::new(DECREMENT))?;
        }
        Ok(Some(json!(value)))
    }))?;

    // Async thunk: the dispatch result has to be awaited
    let synced = store
        .dispatch(AnyAction::async_thunk(move |api| async move {
            tokio::time::sleep(debounce).await;
            api.dispatch(Action::with_payload(ADD, json!(10)))?;
            Ok::<_, StoreError>(Some(json!("synced")))
        }))?
        .settle()
        .await?;
    println!("Async thunk returned {synced:?}");

    time_travel(store, debounce).await?;
    Ok(())
}

async fn time_travel(store: &Store, debounce: Duration) -> Result<()> {
    store.enable_debug();
    for _ in 0..3 {
        tokio::time::sleep(debounce).await;
        store.dispatch(Action::new(INCREMENT))?;
    }
    store.dispatch(Action::new(RESET))?;

    println!("History:");
    for record in store.get_history()? {
        let marker = if record.is_current { "*" } else { " " };
        println!(
            "{marker} {:>2} {} {}",
            record.index,
            record.timestamp.format("%H:%M:%S%.3f"),
            record.action.action_type
        );
    }

    // Rewind to just before the reset and keep that state
    let before_reset = store.history().len().saturating_sub(2);
    store.time_travel_to(before_reset)?;
    println!("Rewound to entry {before_reset}: {}", store.get_state());
    store.disable_debug()?;
    Ok(())
}
