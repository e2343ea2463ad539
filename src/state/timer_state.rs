//! Timer state structure, settings clamping and settings input parsing

use serde::{Deserialize, Serialize};

/// Focus duration used on first launch and for unparseable input
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
/// Break duration used on first launch and for unparseable input
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

pub const MIN_FOCUS_MINUTES: u32 = 1;
pub const MAX_FOCUS_MINUTES: u32 = 120;
pub const MIN_BREAK_MINUTES: u32 = 1;
pub const MAX_BREAK_MINUTES: u32 = 30;

/// Which countdown mode the timer is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Focus,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }
}

/// The single timer record, persisted wholesale after every mutation.
///
/// Field names follow the stored JSON layout (`focusDuration`, `isBreak`, ...).
/// Missing fields take their first-launch defaults and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    /// Focus phase length in minutes
    pub focus_duration: u32,
    /// Break phase length in minutes
    pub break_duration: u32,
    /// Seconds left in the current phase
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_break: bool,
    pub is_auto_loop: bool,
    /// Completed focus phases
    pub session_count: u32,
}

impl TimerState {
    /// Create the first-launch state: 25 minute focus, 5 minute break, idle
    pub fn new() -> Self {
        Self {
            focus_duration: DEFAULT_FOCUS_MINUTES,
            break_duration: DEFAULT_BREAK_MINUTES,
            remaining_seconds: DEFAULT_FOCUS_MINUTES * 60,
            is_running: false,
            is_paused: false,
            is_break: false,
            is_auto_loop: false,
            session_count: 0,
        }
    }

    /// Derive the phase from the running/paused/break flags
    pub fn phase(&self) -> Phase {
        if self.is_break {
            Phase::Break
        } else if self.is_running || self.is_paused {
            Phase::Focus
        } else {
            Phase::Idle
        }
    }

    pub fn focus_seconds(&self) -> u32 {
        self.focus_duration * 60
    }

    pub fn break_seconds(&self) -> u32 {
        self.break_duration * 60
    }

    /// Full length of the current phase in seconds
    pub fn phase_total_seconds(&self) -> u32 {
        if self.is_break {
            self.break_seconds()
        } else {
            self.focus_seconds()
        }
    }

    /// Fraction of the current phase still remaining, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        let total = self.phase_total_seconds();
        if total == 0 {
            return 0.0;
        }
        (f64::from(self.remaining_seconds) / f64::from(total)).clamp(0.0, 1.0)
    }

    /// Upper bound for `remaining_seconds` under the current durations
    pub fn max_remaining_seconds(&self) -> u32 {
        self.focus_duration.max(self.break_duration) * 60
    }

    /// Copy of this state with the running and paused flags cleared.
    ///
    /// A restart never resumes a countdown silently.
    pub fn with_flags_cleared(&self) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            ..self.clone()
        }
    }

    /// Clamp durations into their ranges and the remaining time into its bound.
    pub fn sanitized(mut self) -> Self {
        self.focus_duration = clamp_focus_minutes(i64::from(self.focus_duration));
        self.break_duration = clamp_break_minutes(i64::from(self.break_duration));
        self.remaining_seconds = self.remaining_seconds.min(self.max_remaining_seconds());
        if self.is_running && self.is_paused {
            self.is_paused = false;
        }
        self
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a focus duration to `[1, 120]` minutes
pub fn clamp_focus_minutes(minutes: i64) -> u32 {
    clamp_minutes(minutes, MIN_FOCUS_MINUTES, MAX_FOCUS_MINUTES)
}

/// Clamp a break duration to `[1, 30]` minutes
pub fn clamp_break_minutes(minutes: i64) -> u32 {
    clamp_minutes(minutes, MIN_BREAK_MINUTES, MAX_BREAK_MINUTES)
}

fn clamp_minutes(minutes: i64, min: u32, max: u32) -> u32 {
    // The clamped value always fits in u32.
    minutes.clamp(i64::from(min), i64::from(max)) as u32
}

/// Parse a minutes value typed by the user.
///
/// Leading digits are read the way a numeric text field reads them; anything
/// that yields no number, or zero, falls back to `default`. The result is not
/// clamped yet.
pub fn parse_minutes_input(input: &str, default: u32) -> i64 {
    let trimmed = input.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return i64::from(default);
    }
    // Overlong input saturates so clamping still lands on the bound.
    match digits.parse::<i64>().unwrap_or(i64::MAX) {
        0 => i64::from(default),
        value => sign * value,
    }
}
