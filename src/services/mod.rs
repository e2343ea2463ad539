//! External collaborators module
//!
//! Notifications, persistence and media volume control.

pub mod notifier;
pub mod store;
pub mod volume;

// Re-export main types
pub use notifier::{DesktopNotifier, LogNotifier, Notifier};
pub use store::{JsonFileStore, MemoryStore, TimerStore};
pub use volume::{check_pactl_available, MediaVolume, NoVolume, PactlVolume, VolumeControl};
