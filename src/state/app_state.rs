//! Main application state management
//!
//! `AppState` is the single owner of the timer state machine. It runs the
//! effects each operation returns, owns the tick source, and publishes every
//! new `TimerState` on a watch channel that the break lock and the
//! persistence writer observe.

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{
    machine::{DeferredStart, Effect, TimerMachine},
    Phase, TimerState,
};
use crate::{
    services::Notifier,
    tasks::{break_lock::BreakLock, tick_source::TickSource},
};

/// State guarded by one lock so ticks and cancellations are serialized
struct Engine {
    machine: TimerMachine,
    ticker: TickSource,
}

/// Main application state that owns the timer and its collaborators
pub struct AppState {
    this: Weak<AppState>,
    engine: Mutex<Engine>,
    /// Channel for timer updates
    timer_update_tx: watch::Sender<TimerState>,
    /// Keep the receiver alive to prevent channel closure
    _timer_update_rx: watch::Receiver<TimerState>,
    notifier: Arc<dyn Notifier>,
    break_lock: Arc<BreakLock>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create the application state, restoring `saved` if there is one
    pub fn new(
        port: u16,
        host: String,
        saved: Option<TimerState>,
        notifier: Arc<dyn Notifier>,
        break_lock: Arc<BreakLock>,
    ) -> Arc<Self> {
        let machine = saved.map(TimerMachine::restore).unwrap_or_default();
        let (timer_update_tx, timer_update_rx) = watch::channel(machine.state().clone());

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            engine: Mutex::new(Engine {
                machine,
                ticker: TickSource::default(),
            }),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
            notifier,
            break_lock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        })
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, Engine>, String> {
        self.engine
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Apply one machine operation and carry out its effects.
    ///
    /// Ticking starts and stops while the engine lock is held, so once this
    /// returns no tick from a stopped source can reach the machine.
    fn dispatch<F>(&self, action: Option<&str>, op: F) -> Result<TimerState, String>
    where
        F: FnOnce(&mut Engine) -> Vec<Effect>,
    {
        let mut engine = self.lock_engine()?;
        let effects = op(&mut *engine);

        let mut outbound = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartTicking => {
                    let this = self.this.clone();
                    engine.ticker.start(move |generation| {
                        if let Some(state) = this.upgrade() {
                            state.tick_generation(generation);
                        }
                    });
                }
                Effect::StopTicking => {
                    engine.ticker.stop();
                }
                other => outbound.push(other),
            }
        }

        let snapshot = engine.machine.state().clone();
        // Published under the lock so observers never see updates out of order.
        self.timer_update_tx.send_replace(snapshot.clone());
        drop(engine);

        if let Some(action) = action {
            self.record_action(action);
        }
        for effect in outbound {
            self.run_effect(effect);
        }

        Ok(snapshot)
    }

    fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::PostActive { remaining_seconds } => self.notifier.post_active(remaining_seconds),
            Effect::UpdateActive {
                remaining_seconds,
                sticky,
            } => self.notifier.update_active(remaining_seconds, sticky),
            Effect::PostCompletion => self.notifier.post_completion(),
            Effect::DismissAll => self.notifier.dismiss_all(),
            Effect::Defer {
                delay,
                start,
                epoch,
            } => self.schedule(delay, start, epoch),
            Effect::StartTicking | Effect::StopTicking => {}
        }
    }

    fn schedule(&self, delay: std::time::Duration, start: DeferredStart, epoch: u64) {
        let this = self.this.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(state) = this.upgrade() {
                if let Err(e) = state.dispatch(None, |engine| engine.machine.run_deferred(start, epoch)) {
                    warn!("Failed to run delayed {:?} start: {}", start, e);
                }
            }
        });
    }

    fn tick_generation(&self, generation: u64) {
        let result = self.dispatch(None, |engine| {
            if !engine.ticker.is_current(generation) {
                debug!("Dropping tick from retired tick source");
                return Vec::new();
            }
            engine.machine.tick()
        });
        if let Err(e) = result {
            warn!("Failed to apply tick: {}", e);
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Start or resume the countdown
    pub fn start(&self) -> Result<TimerState, String> {
        self.dispatch(Some("start"), |engine| engine.machine.start())
    }

    /// Pause the focus countdown
    pub fn pause(&self) -> Result<TimerState, String> {
        self.dispatch(Some("pause"), |engine| engine.machine.pause())
    }

    /// Return to the idle focus baseline
    pub fn reset(&self) -> Result<TimerState, String> {
        self.dispatch(Some("reset"), |engine| engine.machine.reset())
    }

    /// Apply new focus/break durations in minutes, clamped
    pub fn update_settings(&self, focus_minutes: i64, break_minutes: i64) -> Result<TimerState, String> {
        self.dispatch(Some("settings"), |engine| {
            engine.machine.update_settings(focus_minutes, break_minutes)
        })
    }

    pub fn toggle_auto_loop(&self) -> Result<TimerState, String> {
        self.dispatch(Some("auto-loop"), |engine| engine.machine.toggle_auto_loop())
    }

    /// End the break early and return to the idle focus baseline
    pub fn on_break_complete(&self) -> Result<TimerState, String> {
        self.dispatch(Some("break-complete"), |engine| engine.machine.on_break_complete())
    }

    /// Deliver one tick directly, for hosts that drive their own clock
    pub fn tick(&self) -> Result<TimerState, String> {
        self.dispatch(None, |engine| engine.machine.tick())
    }

    /// Stop ticking without changing the timer state
    pub fn shutdown(&self) -> Result<TimerState, String> {
        let mut engine = self.lock_engine()?;
        engine.ticker.stop();
        Ok(engine.machine.state().clone())
    }

    /// Get current timer state
    pub fn get_timer_state(&self) -> Result<TimerState, String> {
        self.lock_engine().map(|engine| engine.machine.state().clone())
    }

    pub fn phase(&self) -> Result<Phase, String> {
        self.lock_engine().map(|engine| engine.machine.phase())
    }

    /// Whether a tick source is currently active
    pub fn is_ticking(&self) -> Result<bool, String> {
        self.lock_engine().map(|engine| engine.ticker.is_running())
    }

    /// Observe every published timer state
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.timer_update_tx.subscribe()
    }

    pub fn break_lock(&self) -> Arc<BreakLock> {
        Arc::clone(&self.break_lock)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
