//! Focus Lock - a focus/break timer daemon
//!
//! This library provides the focus timer state machine, the background tick
//! source that drives it, the break lock that mutes media during breaks, and
//! the HTTP surface host UIs use to control it.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, Phase, TimerState};
pub use utils::signals::shutdown_signal;
