//! Persistence writer task

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{services::TimerStore, state::TimerState};

/// Background task writing every published timer state to the store.
///
/// Writes are best effort: a failure is logged and the next state change
/// supersedes it, with no retry. If states arrive faster than the store can
/// write them, only the newest one is written.
pub async fn persistence_task(mut timer_rx: watch::Receiver<TimerState>, store: Arc<dyn TimerStore>) {
    info!("Starting persistence task");

    while timer_rx.changed().await.is_ok() {
        let snapshot = timer_rx.borrow_and_update().clone();
        let store = Arc::clone(&store);

        match tokio::task::spawn_blocking(move || store.save_timer_state(&snapshot)).await {
            Ok(Ok(())) => debug!("Timer state persisted"),
            Ok(Err(e)) => warn!("Failed to persist timer state: {:#}", e),
            Err(e) => warn!("Persistence write panicked: {}", e),
        }
    }

    debug!("Timer channel closed, persistence task exiting");
}
