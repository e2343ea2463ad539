//! Focus Lock - a focus/break timer daemon
//!
//! This is the main entry point for the focus-lock application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use focus_lock::{
    api::create_router,
    config::{Config, NotifierKind, VolumeKind},
    services::{
        check_pactl_available, DesktopNotifier, JsonFileStore, LogNotifier, MediaVolume, NoVolume,
        Notifier, PactlVolume, TimerStore,
    },
    state::AppState,
    tasks::{break_lock_task, persistence_task, BreakLock},
    utils::shutdown_signal,
};

fn build_notifier(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Desktop => match DesktopNotifier::spawn() {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!("Desktop notifications unavailable, logging instead: {}", e);
                Arc::new(LogNotifier)
            }
        },
    }
}

async fn build_volume(kind: VolumeKind) -> MediaVolume {
    match kind {
        VolumeKind::Pactl => match check_pactl_available().await {
            Ok(()) => MediaVolume::new(PactlVolume),
            Err(e) => {
                warn!("{}", e);
                MediaVolume::new(NoVolume)
            }
        },
        VolumeKind::None => MediaVolume::new(NoVolume),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_lock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-lock v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn TimerStore> = Arc::new(JsonFileStore::new(config.data_dir()));
    let saved = match store.load_timer_state() {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Could not load saved timer state, using defaults: {:#}", e);
            None
        }
    };
    info!("Configuration: host={}, port={}, data_dir={}",
          config.host, config.port, config.data_dir().display());

    let break_lock = Arc::new(BreakLock::new(build_volume(config.volume).await));
    let state = AppState::new(
        config.port,
        config.host.clone(),
        saved,
        build_notifier(config.notifier),
        Arc::clone(&break_lock),
    );

    tokio::spawn(persistence_task(state.subscribe(), Arc::clone(&store)));
    tokio::spawn(break_lock_task(Arc::clone(&state)));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start          - Start or resume the countdown");
    info!("  POST /timer/pause          - Pause the focus countdown");
    info!("  POST /timer/reset          - Reset to the idle focus baseline");
    info!("  POST /timer/auto-loop      - Toggle auto-loop");
    info!("  PUT  /timer/settings       - Update focus/break durations");
    info!("  POST /timer/break-complete - End the current break");
    info!("  GET  /lock                 - Break lock view");
    info!("  POST /lock/back            - Back navigation request");
    info!("  GET  /status               - Current status");
    info!("  GET  /health               - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    match state.shutdown() {
        Ok(final_state) => {
            if let Err(e) = store.save_timer_state(&final_state) {
                warn!("Failed to persist final timer state: {:#}", e);
            }
        }
        Err(e) => warn!("Failed to stop timer: {}", e),
    }
    break_lock.release().await;

    info!("Server shutdown complete");
    Ok(())
}
