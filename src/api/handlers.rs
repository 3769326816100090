//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};

use crate::{
    engine::{TimerEngine, TimerEvent, TokioHost},
    state::{app_state::StateError, AppState, TimerStateExport},
};
use super::responses::{timer_status, ApiResponse, HealthResponse, StatusResponse, VisibilityRequest};

type ErrorResponse = (StatusCode, Json<ApiResponse>);
type ControlResult = Result<Json<ApiResponse>, ErrorResponse>;

/// Map a failed operation to a status code and an error body
fn error_response(state: &AppState, action: &str, err: StateError) -> ErrorResponse {
    let code = match &err {
        StateError::Timer(e) if e.is_guard_violation() => StatusCode::CONFLICT,
        StateError::Timer(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StateError::Lock(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if code == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Failed to {}: {}", action, err);
    } else {
        warn!("Rejected {}: {}", action, err);
    }

    let timer = state
        .inspect(|engine| engine.current_state())
        .ok()
        .flatten();
    (code, Json(ApiResponse::error(err.to_string(), timer)))
}

fn control<F>(state: &AppState, action: &str, message: &str, op: F) -> ControlResult
where
    F: FnOnce(&mut TimerEngine<TokioHost>) -> crate::error::Result<()>,
{
    match state.apply(action, op) {
        Ok(timer) => Ok(Json(ApiResponse::from_timer(message.to_string(), timer))),
        Err(e) => Err(error_response(state, action, e)),
    }
}

/// Handle POST /start - Start the current phase
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control(&state, "start", "Timer started", |engine| engine.start())
}

/// Handle POST /pause - Pause the running phase
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control(&state, "pause", "Timer paused", |engine| engine.pause())
}

/// Handle POST /resume - Resume a paused phase
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control(&state, "resume", "Timer resumed", |engine| engine.resume())
}

/// Handle POST /reset - Return to a fresh first work phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control(&state, "reset", "Timer reset", |engine| engine.reset())
}

/// Handle POST /complete - End the current phase early
pub async fn complete_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control(&state, "complete", "Phase completed", |engine| engine.complete())
}

/// Handle POST /visibility - Report the client view as hidden or visible
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> ControlResult {
    match state.set_visibility(request.visible) {
        Ok(timer) => {
            let message = if request.visible { "View visible" } else { "View hidden" };
            Ok(Json(ApiResponse::from_timer(message.to_string(), timer)))
        }
        Err(e) => Err(error_response(&state, "set visibility", e)),
    }
}

/// Handle GET /snapshot - Export the engine state for persistence
pub async fn snapshot_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerStateExport>, ErrorResponse> {
    state
        .export()
        .map(Json)
        .map_err(|e| error_response(&state, "export", e))
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let snapshot = state.inspect(|engine| {
        (
            engine.current_state(),
            engine.session_mode().cloned(),
            engine.phase_seconds(),
            engine.progress_percent(),
            engine.completed_cycles(),
            engine.is_hidden(),
        )
    });

    let (timer, mode, phase_seconds, progress_percent, completed_cycles, hidden) = match snapshot {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to read timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        status: timer_status(timer.as_ref()).to_string(),
        timer,
        mode,
        phase_seconds,
        progress_percent,
        completed_cycles,
        hidden,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Engine events read from a broadcast receiver. A lagging reader skips
/// what it missed; the stream ends when the sender is dropped.
pub fn timer_events(rx: broadcast::Receiver<TimerEvent>) -> impl Stream<Item = TimerEvent> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// Handle GET /events - Stream engine events as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Event stream subscriber connected");
    let events = timer_events(state.event_tx.subscribe()).filter_map(|event| async move {
        match Event::default().event(event.kind().to_string()).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                warn!("Failed to encode '{}' event: {}", event.kind(), e);
                None
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EventKind;
    use crate::state::{Phase, SessionModeConfig, SessionModeId};

    fn app(mode: SessionModeId) -> Arc<AppState> {
        Arc::new(
            AppState::new(0, "127.0.0.1".to_string(), None, SessionModeConfig::preset(mode))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn start_then_pause() {
        let state = app(SessionModeId::Pomodoro);

        let Json(started) = start_handler(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(started.status, "running");

        let Json(paused) = pause_handler(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(paused.status, "paused");
        assert!(paused.timer.unwrap().is_paused);
    }

    #[tokio::test]
    async fn guard_violations_are_conflicts() {
        let state = app(SessionModeId::Pomodoro);
        let (code, Json(body)) = resume_handler(State(Arc::clone(&state))).await.unwrap_err();
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body.status, "error");
        assert_eq!(timer_status(body.timer.as_ref()), "ready");
    }

    #[tokio::test]
    async fn complete_moves_to_break() {
        let state = app(SessionModeId::DeepWork);
        start_handler(State(Arc::clone(&state))).await.unwrap();
        let Json(done) = complete_handler(State(Arc::clone(&state))).await.unwrap();
        let timer = done.timer.unwrap();
        assert_eq!(timer.phase, Phase::Break);
        assert_eq!(timer.time_remaining, 600);
        assert_eq!(done.status, "ready");
    }

    #[tokio::test]
    async fn status_reports_mode_and_last_action() {
        let state = app(SessionModeId::Zen);
        start_handler(State(Arc::clone(&state))).await.unwrap();
        visibility_handler(State(Arc::clone(&state)), Json(VisibilityRequest { visible: false }))
            .await
            .unwrap();

        let Json(status) = status_handler(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(status.status, "running");
        assert_eq!(status.mode.unwrap().id(), SessionModeId::Zen);
        assert_eq!(status.phase_seconds, Some(900));
        assert!(status.hidden);
        assert_eq!(status.last_action.as_deref(), Some("start"));
    }

    #[tokio::test]
    async fn snapshot_exports_current_state() {
        let state = app(SessionModeId::Pomodoro);
        start_handler(State(Arc::clone(&state))).await.unwrap();
        let Json(export) = snapshot_handler(State(Arc::clone(&state))).await.unwrap();
        assert!(export.timer_state.is_running());
        assert!(export.start_time.is_some());
    }

    #[tokio::test]
    async fn event_stream_carries_engine_events() {
        let state = app(SessionModeId::Pomodoro);
        let mut events = Box::pin(timer_events(state.event_tx.subscribe()));

        start_handler(State(Arc::clone(&state))).await.unwrap();
        pause_handler(State(Arc::clone(&state))).await.unwrap();

        let first = events.next().await.unwrap();
        assert_eq!(first.kind(), EventKind::Start);
        let second = events.next().await.unwrap();
        assert_eq!(second.kind(), EventKind::Pause);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let Json(health) = health_handler().await;
        assert_eq!(health.status, "ok");
    }
}
