//! Notification bridge
//!
//! Two logical channels: the ongoing "timer" notification (sticky while
//! running) and the one-shot "completion" alert. Delivery is fire-and-forget;
//! failures are logged and never reach the timer.

use std::{sync::mpsc, thread};

use notify_rust::{Notification, Timeout};
use tracing::{debug, info, warn};

use crate::utils::format_clock;

const APP_NAME: &str = "focus-lock";
const ACTIVE_TITLE: &str = "Focus Session Active";
const COMPLETION_TITLE: &str = "Focus Session Complete!";
const COMPLETION_BODY: &str = "Great work! Time for a break.";

/// Operations the timer uses to mirror its state in OS notifications
pub trait Notifier: Send + Sync {
    /// Show the ongoing timer notification
    fn post_active(&self, remaining_seconds: u32);
    /// Refresh the ongoing notification; non-sticky once paused
    fn update_active(&self, remaining_seconds: u32, sticky: bool);
    /// One-shot alert when a focus phase completes
    fn post_completion(&self);
    fn dismiss_all(&self);
}

/// Body text of the ongoing timer notification
pub fn active_body(remaining_seconds: u32) -> String {
    format!("Time remaining: {}", format_clock(remaining_seconds))
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post_active(&self, remaining_seconds: u32) {
        info!("[timer] {}: {}", ACTIVE_TITLE, active_body(remaining_seconds));
    }

    fn update_active(&self, remaining_seconds: u32, sticky: bool) {
        debug!(
            "[timer] {}: {} (sticky={})",
            ACTIVE_TITLE,
            active_body(remaining_seconds),
            sticky
        );
    }

    fn post_completion(&self) {
        info!("[completion] {}: {}", COMPLETION_TITLE, COMPLETION_BODY);
    }

    fn dismiss_all(&self) {
        debug!("[timer] notifications dismissed");
    }
}

enum Command {
    Active { remaining_seconds: u32, sticky: bool },
    Completion,
    DismissAll,
}

/// Desktop notifications through the platform notification server.
///
/// Notification calls block on the platform, so they run in order on a
/// dedicated worker thread and the timer only enqueues them.
pub struct DesktopNotifier {
    tx: mpsc::Sender<Command>,
}

impl DesktopNotifier {
    /// Start the notification worker thread
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("notifications".to_string())
            .spawn(move || notification_worker(rx))?;
        Ok(Self { tx })
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("Notification worker has stopped, dropping notification");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn post_active(&self, remaining_seconds: u32) {
        self.send(Command::Active {
            remaining_seconds,
            sticky: true,
        });
    }

    fn update_active(&self, remaining_seconds: u32, sticky: bool) {
        self.send(Command::Active {
            remaining_seconds,
            sticky,
        });
    }

    fn post_completion(&self) {
        self.send(Command::Completion);
    }

    fn dismiss_all(&self) {
        self.send(Command::DismissAll);
    }
}

fn notification_worker(rx: mpsc::Receiver<Command>) {
    let mut active = ActiveNotification::default();

    for command in rx {
        match command {
            Command::Active {
                remaining_seconds,
                sticky,
            } => active.show(remaining_seconds, sticky),
            Command::Completion => {
                let result = Notification::new()
                    .appname(APP_NAME)
                    .summary(COMPLETION_TITLE)
                    .body(COMPLETION_BODY)
                    .show();
                if let Err(e) = result {
                    warn!("Failed to post completion notification: {}", e);
                }
            }
            Command::DismissAll => active.close(),
        }
    }
    debug!("Notification worker exiting");
}

fn fill_active(notification: &mut Notification, remaining_seconds: u32, sticky: bool) {
    notification
        .appname(APP_NAME)
        .summary(ACTIVE_TITLE)
        .body(&active_body(remaining_seconds))
        .timeout(if sticky { Timeout::Never } else { Timeout::Default });
}

/// The ongoing notification, replaced in place where the platform allows it
#[derive(Default)]
struct ActiveNotification {
    #[cfg(all(unix, not(target_os = "macos")))]
    handle: Option<notify_rust::NotificationHandle>,
}

impl ActiveNotification {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn show(&mut self, remaining_seconds: u32, sticky: bool) {
        if let Some(handle) = self.handle.as_mut() {
            fill_active(handle, remaining_seconds, sticky);
            handle.update();
            return;
        }

        let mut notification = Notification::new();
        fill_active(&mut notification, remaining_seconds, sticky);
        match notification.show() {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => warn!("Failed to post timer notification: {}", e),
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn show(&mut self, remaining_seconds: u32, sticky: bool) {
        let mut notification = Notification::new();
        fill_active(&mut notification, remaining_seconds, sticky);
        if let Err(e) = notification.show() {
            warn!("Failed to post timer notification: {}", e);
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn close(&mut self) {
        debug!("Dismissing notifications is not supported on this platform");
    }
}
