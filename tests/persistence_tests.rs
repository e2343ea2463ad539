mod common;

use std::{sync::Arc, time::Duration};

use common::Harness;
use focus_lock::{
    services::{JsonFileStore, MemoryStore, TimerStore},
    tasks::persistence_task,
    TimerState,
};

#[test]
fn test_save_load_round_trip_clears_flags() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let state = TimerState {
        focus_duration: 50,
        break_duration: 10,
        remaining_seconds: 2000,
        is_running: true,
        is_auto_loop: true,
        session_count: 2,
        ..TimerState::new()
    };

    store.save_timer_state(&state).unwrap();
    let loaded = store.load_timer_state().unwrap().unwrap();

    assert_eq!(
        loaded,
        TimerState {
            is_running: false,
            is_paused: false,
            ..state
        }
    );
}

#[test]
fn test_reads_record_with_missing_and_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("timer.json"),
        r#"{"focusDuration": 30, "isPaused": true, "theme": "dark"}"#,
    )
    .unwrap();

    let loaded = JsonFileStore::new(dir.path()).load_timer_state().unwrap().unwrap();
    assert_eq!(loaded.focus_duration, 30);
    assert_eq!(loaded.break_duration, 5);
    assert!(!loaded.is_paused);
}

#[tokio::test(start_paused = true)]
async fn test_every_mutation_reaches_the_store() {
    let harness = Harness::new(None);
    let store = Arc::new(MemoryStore::new());
    tokio::spawn(persistence_task(harness.state.subscribe(), store.clone()));

    harness.state.update_settings(10, 3).unwrap();
    harness.state.toggle_auto_loop().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let saved = store.load_timer_state().unwrap().unwrap();
    assert_eq!(saved.focus_duration, 10);
    assert_eq!(saved.break_duration, 3);
    assert_eq!(saved.remaining_seconds, 600);
    assert!(saved.is_auto_loop);
}

#[tokio::test(start_paused = true)]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn TimerStore> = Arc::new(JsonFileStore::new(dir.path()));

    let first = Harness::new(None);
    tokio::spawn(persistence_task(first.state.subscribe(), Arc::clone(&store)));
    first.state.update_settings(15, 5).unwrap();
    first.state.start().unwrap();
    first.tick_times(30);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = Harness::new(store.load_timer_state().unwrap());
    let timer = second.timer();
    assert_eq!(timer.focus_duration, 15);
    assert_eq!(timer.remaining_seconds, 870);
    assert!(!timer.is_running);
    assert!(!second.state.is_ticking().unwrap());
}
