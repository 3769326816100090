//! Focus Timer - a drift-free focus timer with a local control API
//!
//! This is the composition point: it builds the one engine instance, restores
//! any saved state, and wires the engine to its host tasks and HTTP surface.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use focus_timer::{
    api::create_router,
    config::Config,
    services::{load_snapshot, save_snapshot},
    state::AppState,
    tasks::{autosave_task, frame_loop_task},
    utils::shutdown_signal,
    TimerError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer v{}", env!("CARGO_PKG_VERSION"));
    let mode = config.session_mode()?;
    info!(
        "Configuration: host={}, port={}, mode={}, work={}min, break={}min",
        config.host,
        config.port,
        mode.id(),
        mode.default_work_duration(),
        mode.default_break_duration()
    );

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.state_file.clone(),
        mode.clone(),
    )?);

    // Pick up where the previous run left off, if it used the same mode
    if let Some(path) = &config.state_file {
        match load_snapshot(path).await {
            Ok(Some(snapshot)) if snapshot.session_mode_config.id() == mode.id() => {
                if let Err(e) = state.restore(snapshot) {
                    warn!("Ignoring saved state: {}", e);
                }
            }
            Ok(Some(snapshot)) => {
                let mismatch = TimerError::ModeMismatch {
                    expected: mode.id(),
                    found: snapshot.session_mode_config.id(),
                };
                warn!("Ignoring saved state: {}", mismatch);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load saved state: {:#}", e),
        }
    }

    // Drive engine frames
    let frame_state = Arc::clone(&state);
    let frame_interval = config.frame_interval();
    tokio::spawn(async move {
        frame_loop_task(frame_state, frame_interval).await;
    });

    if let Some(path) = config.state_file.clone() {
        let save_state = Arc::clone(&state);
        let every = config.autosave_interval();
        tokio::spawn(async move {
            autosave_task(save_state, path, every).await;
        });
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start      - Start the current phase");
    info!("  POST /pause      - Pause the running phase");
    info!("  POST /resume     - Resume a paused phase");
    info!("  POST /reset      - Reset to the first work phase");
    info!("  POST /complete   - Complete the current phase now");
    info!("  POST /visibility - Report the view as hidden/visible");
    info!("  GET  /snapshot   - Export the timer state");
    info!("  GET  /events     - Stream timer events (SSE)");
    info!("  GET  /status     - Check current status");
    info!("  GET  /health     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Some(path) = &config.state_file {
        match state.export() {
            Ok(export) => {
                if let Err(e) = save_snapshot(path, &export).await {
                    error!("Failed to save state on shutdown: {:#}", e);
                }
            }
            Err(e) => warn!("Nothing to save on shutdown: {}", e),
        }
    }
    if let Err(e) = state.shutdown() {
        error!("Failed to shut the timer down: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
