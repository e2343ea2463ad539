//! Break lock controller
//!
//! While the timer is in a break the lock is engaged: back navigation is
//! refused, media is muted, and the lock view mirrors the remaining break time
//! read from the timer's watch channel. Leaving the break by any path
//! (countdown, forced completion, reset, shutdown) releases the lock and
//! restores the media volume.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    services::MediaVolume,
    state::{AppState, TimerState},
    utils::format_clock,
};

pub const LOCK_TITLE: &str = "BREAK TIME";
pub const LOCK_SUBTITLE: &str = "Screen locked for recovery.";

/// What the host UI renders for the lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockView {
    pub engaged: bool,
    pub title: String,
    pub subtitle: String,
    pub remaining_seconds: u32,
    pub remaining_clock: String,
    /// Fraction of the break still remaining
    pub progress: f64,
    pub media_muted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Countdown {
    remaining_seconds: u32,
    total_seconds: u32,
}

pub struct BreakLock {
    engaged: AtomicBool,
    countdown: Mutex<Countdown>,
    volume: MediaVolume,
}

impl BreakLock {
    pub fn new(volume: MediaVolume) -> Self {
        Self {
            engaged: AtomicBool::new(false),
            countdown: Mutex::new(Countdown::default()),
            volume,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    /// Handle a back-navigation request from the host UI.
    ///
    /// Returns true when the request was consumed (blocked) by the lock.
    pub fn handle_back_navigation(&self) -> bool {
        let blocked = self.is_engaged();
        if blocked {
            debug!("Back navigation blocked by break lock");
        }
        blocked
    }

    pub fn view(&self) -> LockView {
        let countdown = self.countdown.lock().map(|c| *c).unwrap_or_default();
        let progress = if countdown.total_seconds == 0 {
            0.0
        } else {
            f64::from(countdown.remaining_seconds) / f64::from(countdown.total_seconds)
        };

        LockView {
            engaged: self.is_engaged(),
            title: LOCK_TITLE.to_string(),
            subtitle: LOCK_SUBTITLE.to_string(),
            remaining_seconds: countdown.remaining_seconds,
            remaining_clock: format_clock(countdown.remaining_seconds),
            progress: progress.clamp(0.0, 1.0),
            media_muted: self.volume.is_muted(),
        }
    }

    /// Engage the lock and mute media. Engaging twice is a no-op.
    pub async fn engage(&self) {
        if self.engaged.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Break lock engaged");
        self.volume.mute().await;
    }

    /// Release the lock and restore media. Releasing twice is a no-op.
    pub async fn release(&self) {
        if !self.engaged.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Break lock released");
        if let Ok(mut countdown) = self.countdown.lock() {
            *countdown = Countdown::default();
        }
        self.volume.restore().await;
    }

    /// Follow one published timer state.
    ///
    /// The timer's own tick ends the break, so the lock only mirrors the
    /// countdown and releases once a state outside the break is published.
    pub async fn observe(&self, state: &TimerState) {
        if !state.is_break {
            self.release().await;
            return;
        }

        if let Ok(mut countdown) = self.countdown.lock() {
            *countdown = Countdown {
                remaining_seconds: state.remaining_seconds,
                total_seconds: state.break_seconds(),
            };
        }
        self.engage().await;
    }
}

/// Background task keeping the break lock in step with the timer
pub async fn break_lock_task(state: Arc<AppState>) {
    info!("Starting break lock task");

    let lock = state.break_lock();
    let mut timer_rx = state.subscribe();

    loop {
        let snapshot = timer_rx.borrow_and_update().clone();
        lock.observe(&snapshot).await;

        if timer_rx.changed().await.is_err() {
            break;
        }
    }

    lock.release().await;
}
