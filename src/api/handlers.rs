//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use super::responses::{
    ApiResponse, HealthResponse, NavigationResponse, SettingsRequest, StatusResponse, TimerView,
};
use crate::state::{
    timer_state::{parse_minutes_input, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES},
    AppState, TimerState,
};

type HandlerResult = Result<Json<ApiResponse>, StatusCode>;

fn respond(result: Result<TimerState, String>, operation: &str, message: &str) -> HandlerResult {
    match result {
        Ok(timer) => {
            info!("{} endpoint called", operation);
            Ok(Json(ApiResponse::new(message.to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to {}: {}", operation, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Turn a settings field into minutes.
///
/// Numbers pass through (and are clamped later); text is parsed like an input
/// field, falling back to `default`. A missing field keeps `current`.
pub fn minutes_from_value(value: Option<&Value>, current: u32, default: u32) -> i64 {
    match value {
        None | Some(Value::Null) => i64::from(current),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(i64::from(default)),
        Some(Value::String(text)) => parse_minutes_input(text, default),
        Some(_) => i64::from(default),
    }
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    respond(state.start(), "start", "Timer started")
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    respond(state.pause(), "pause", "Timer paused")
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    respond(state.reset(), "reset", "Timer reset")
}

/// Handle POST /timer/auto-loop
pub async fn auto_loop_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    respond(state.toggle_auto_loop(), "auto-loop", "Auto-loop toggled")
}

/// Handle POST /timer/break-complete
pub async fn break_complete_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    respond(state.on_break_complete(), "break-complete", "Break completed")
}

/// Handle PUT /timer/settings
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> HandlerResult {
    let current = match state.get_timer_state() {
        Ok(current) => current,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let focus = minutes_from_value(
        request.focus_minutes.as_ref(),
        current.focus_duration,
        DEFAULT_FOCUS_MINUTES,
    );
    let brk = minutes_from_value(
        request.break_minutes.as_ref(),
        current.break_duration,
        DEFAULT_BREAK_MINUTES,
    );

    respond(state.update_settings(focus, brk), "settings", "Settings updated")
}

/// Handle GET /lock - Current break lock view
pub async fn lock_handler(State(state): State<Arc<AppState>>) -> Json<crate::tasks::LockView> {
    Json(state.break_lock().view())
}

/// Handle POST /lock/back - Back navigation request from the host UI
pub async fn back_handler(State(state): State<Arc<AppState>>) -> Json<NavigationResponse> {
    Json(NavigationResponse {
        blocked: state.break_lock().handle_back_navigation(),
        timestamp: Utc::now(),
    })
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_timer_state() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let ticking = match state.is_ticking() {
        Ok(ticking) => ticking,
        Err(e) => {
            error!("Failed to get tick source state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer: TimerView::from(timer),
        lock: state.break_lock().view(),
        ticking,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
