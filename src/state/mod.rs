//! State management module
//!
//! The timer record, the state machine that mutates it, and the application
//! state that owns both.

pub mod app_state;
pub mod machine;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use machine::{DeferredStart, Effect, TimerMachine};
pub use timer_state::{Phase, TimerState};
