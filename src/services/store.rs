//! Persistence of the timer state
//!
//! One JSON record per logical key, last write wins. Callers treat every write
//! as a best-effort side effect: errors are reported back for logging and are
//! never retried.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context};
use serde::{de::DeserializeOwned, Serialize};

use crate::state::TimerState;

/// Key of the timer record
pub const TIMER_KEY: &str = "timer";

/// Durable storage for the timer state
pub trait TimerStore: Send + Sync {
    /// Load the saved state with the running and paused flags cleared.
    /// Returns `None` on first launch.
    fn load_timer_state(&self) -> anyhow::Result<Option<TimerState>>;

    /// Overwrite the saved state
    fn save_timer_state(&self, state: &TimerState) -> anyhow::Result<()>;
}

/// Key-value store keeping each key in `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read and decode a key, `None` if it was never written
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let path = self.path_for(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        let value = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// Encode and write a key, replacing the file atomically
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(value)?;

        fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl TimerStore for JsonFileStore {
    fn load_timer_state(&self) -> anyhow::Result<Option<TimerState>> {
        Ok(self
            .get::<TimerState>(TIMER_KEY)?
            .map(|state| state.with_flags_cleared()))
    }

    fn save_timer_state(&self, state: &TimerState) -> anyhow::Result<()> {
        self.set(TIMER_KEY, state)
    }
}

/// In-memory store holding the encoded record, for hosts without a disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerStore for MemoryStore {
    fn load_timer_state(&self) -> anyhow::Result<Option<TimerState>> {
        let record = self
            .record
            .lock()
            .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;

        match record.as_deref() {
            Some(data) => {
                let state: TimerState = serde_json::from_str(data)?;
                Ok(Some(state.with_flags_cleared()))
            }
            None => Ok(None),
        }
    }

    fn save_timer_state(&self, state: &TimerState) -> anyhow::Result<()> {
        let data = serde_json::to_string(state)?;
        let mut record = self
            .record
            .lock()
            .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
        *record = Some(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_state() -> TimerState {
        TimerState {
            focus_duration: 40,
            remaining_seconds: 1234,
            is_running: true,
            is_auto_loop: true,
            session_count: 3,
            ..TimerState::new()
        }
    }

    #[test]
    fn test_file_round_trip_clears_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        let state = running_state();

        store.save_timer_state(&state).unwrap();
        let loaded = store.load_timer_state().unwrap().unwrap();

        assert_eq!(loaded, TimerState { is_running: false, ..state });
    }

    #[test]
    fn test_first_launch_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_timer_state().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("timer.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_timer_state().is_err());
    }

    #[test]
    fn test_scalar_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.set("first_launch", &"done").unwrap();
        store.save_timer_state(&TimerState::new()).unwrap();

        assert_eq!(store.get::<String>("first_launch").unwrap().as_deref(), Some("done"));
        assert!(store.get::<u32>("click_count").unwrap().is_none());
    }

    #[test]
    fn test_memory_round_trip_clears_flags() {
        let store = MemoryStore::new();
        let state = TimerState {
            is_running: false,
            is_paused: true,
            ..running_state()
        };

        store.save_timer_state(&state).unwrap();
        let loaded = store.load_timer_state().unwrap().unwrap();

        assert_eq!(loaded, TimerState { is_paused: false, ..state });
    }
}
