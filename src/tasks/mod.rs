//! Background tasks module
//!
//! The tick source driving the countdown, the break lock controller and the
//! persistence writer.

pub mod break_lock;
pub mod persistence;
pub mod tick_source;

// Re-export main types and functions
pub use break_lock::{break_lock_task, BreakLock, LockView};
pub use persistence::persistence_task;
pub use tick_source::{spawn_ticks, TickHandle, TickSource, TICK_PERIOD};
