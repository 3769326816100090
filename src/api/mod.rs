//! HTTP API module
//!
//! This module contains the local control endpoints and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/pause", post(pause_handler))
        .route("/resume", post(resume_handler))
        .route("/reset", post(reset_handler))
        .route("/complete", post(complete_handler))
        .route("/visibility", post(visibility_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    use crate::state::{SessionModeConfig, SessionModeId};

    fn app() -> Router {
        let state = AppState::new(
            0,
            "127.0.0.1".to_string(),
            None,
            SessionModeConfig::preset(SessionModeId::Pomodoro),
        )
        .unwrap();
        create_router(Arc::new(state))
    }

    async fn send(router: &Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn control_routes_map_guard_violations_to_conflict() {
        let router = app();

        let response = send(&router, Method::POST, "/start").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "running");

        let response = send(&router, Method::POST, "/pause").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&router, Method::POST, "/pause").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["timer"]["isPaused"], true);
    }

    #[tokio::test]
    async fn read_routes_are_wired() {
        let router = app();

        let response = send(&router, Method::GET, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");

        let response = send(&router, Method::GET, "/status").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ready");

        let response = send(&router, Method::GET, "/snapshot").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["timerState"]["timeRemaining"], 1500);

        let response = send(&router, Method::GET, "/events").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let router = app();
        let response = send(&router, Method::GET, "/start").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
