//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{Phase, TimerState},
    tasks::LockView,
    utils::format_clock,
};

/// Timer snapshot with the derived fields a UI needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub state: TimerState,
    pub phase: Phase,
    pub remaining_clock: String,
    pub phase_total_seconds: u32,
    pub progress: f64,
}

impl From<TimerState> for TimerView {
    fn from(state: TimerState) -> Self {
        Self {
            phase: state.phase(),
            remaining_clock: format_clock(state.remaining_seconds),
            phase_total_seconds: state.phase_total_seconds(),
            progress: state.progress(),
            state,
        }
    }
}

/// Response to timer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl ApiResponse {
    pub fn new(message: String, timer: TimerState) -> Self {
        let timer = TimerView::from(timer);
        Self {
            status: timer.phase.as_str().to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// `PUT /timer/settings` body.
///
/// Values may be JSON numbers or raw text from an input field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub focus_minutes: Option<serde_json::Value>,
    pub break_minutes: Option<serde_json::Value>,
}

/// Reply to a back-navigation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResponse {
    pub blocked: bool,
    pub timestamp: DateTime<Utc>,
}

/// Full status with timer, lock and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerView,
    pub lock: LockView,
    pub ticking: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
