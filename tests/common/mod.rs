#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use focus_lock::{
    services::{MediaVolume, Notifier, VolumeControl},
    state::AppState,
    tasks::{break_lock_task, BreakLock},
    TimerState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Active(u32),
    Update(u32, bool),
    Completion,
    DismissAll,
}

/// Notifier recording everything it is asked to show
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn post_active(&self, remaining_seconds: u32) {
        self.sent.lock().unwrap().push(Sent::Active(remaining_seconds));
    }

    fn update_active(&self, remaining_seconds: u32, sticky: bool) {
        self.sent.lock().unwrap().push(Sent::Update(remaining_seconds, sticky));
    }

    fn post_completion(&self) {
        self.sent.lock().unwrap().push(Sent::Completion);
    }

    fn dismiss_all(&self) {
        self.sent.lock().unwrap().push(Sent::DismissAll);
    }
}

/// Volume control backed by a shared level
#[derive(Clone)]
pub struct FakeVolume {
    pub level: Arc<Mutex<u8>>,
}

#[async_trait]
impl VolumeControl for FakeVolume {
    async fn get_volume(&self) -> Result<u8, String> {
        Ok(*self.level.lock().unwrap())
    }

    async fn set_volume(&self, percent: u8) -> Result<(), String> {
        *self.level.lock().unwrap() = percent;
        Ok(())
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
    pub volume: Arc<Mutex<u8>>,
}

impl Harness {
    /// App state with the break lock task running and media at 80%
    pub fn new(saved: Option<TimerState>) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let volume = Arc::new(Mutex::new(80));
        let lock = Arc::new(BreakLock::new(MediaVolume::new(FakeVolume {
            level: Arc::clone(&volume),
        })));

        let state = AppState::new(
            20554,
            "127.0.0.1".to_string(),
            saved,
            notifier.clone(),
            lock,
        );
        tokio::spawn(break_lock_task(Arc::clone(&state)));

        Self {
            state,
            notifier,
            volume,
        }
    }

    pub fn timer(&self) -> TimerState {
        self.state.get_timer_state().unwrap()
    }

    pub fn volume(&self) -> u8 {
        *self.volume.lock().unwrap()
    }

    pub fn tick_times(&self, times: usize) {
        for _ in 0..times {
            self.state.tick().unwrap();
        }
    }
}

/// Let spawned tasks catch up without moving past the next second
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
