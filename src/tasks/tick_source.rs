//! Background tick source
//!
//! Delivers one tick per second from a spawned task. The task keeps running
//! while the host UI is in the background; if the runtime is held up, late
//! ticks are delivered as ordinary ticks with no catch-up burst.

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Cadence of the timer countdown
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running tick task. Stopping (or dropping) it cancels the task.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Cancel the tick task
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task calling `on_tick` every `period`, first after one full period
pub fn spawn_ticks<F>(period: Duration, mut on_tick: F) -> TickHandle
where
    F: FnMut() + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            on_tick();
        }
    });

    TickHandle { task }
}

/// Single-subscription tick source.
///
/// At most one tick task is active. Each start gets a fresh generation number
/// that is passed to the callback; `stop` retires it, so a tick already in
/// flight can tell it is stale by checking `is_current` under the same lock
/// that guards the `TickSource`.
#[derive(Debug)]
pub struct TickSource {
    period: Duration,
    active: Option<TickHandle>,
    generation: u64,
}

impl TickSource {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: None,
            generation: 0,
        }
    }

    /// Start ticking. Returns false (and changes nothing) if already running.
    pub fn start<F>(&mut self, on_tick: F) -> bool
    where
        F: Fn(u64) + Send + 'static,
    {
        if self.active.is_some() {
            debug!("Tick source already running");
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        self.active = Some(spawn_ticks(self.period, move || on_tick(generation)));
        debug!("Tick source started (generation {})", generation);
        true
    }

    /// Stop ticking. Safe to call when already stopped.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(handle) => {
                self.generation += 1;
                handle.stop();
                debug!("Tick source stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a tick tagged with `generation` belongs to the active task
    pub fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && self.generation == generation
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}
