//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{SessionModeConfig, TimerState};

/// API response structure for timer control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: Option<TimerState>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: Option<TimerState>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a response whose status reflects the timer state
    pub fn from_timer(message: String, timer: Option<TimerState>) -> Self {
        Self::new(timer_status(timer.as_ref()).to_string(), message, timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: Option<TimerState>) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// Short label for the engine's state machine position
pub fn timer_status(timer: Option<&TimerState>) -> &'static str {
    match timer {
        None => "uninitialized",
        Some(t) if t.is_running() => "running",
        Some(t) if t.is_paused => "paused",
        Some(_) => "ready",
    }
}

/// Request body for POST /visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// Status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub timer: Option<TimerState>,
    pub mode: Option<SessionModeConfig>,
    pub phase_seconds: Option<u32>,
    pub progress_percent: f64,
    pub completed_cycles: u32,
    pub hidden: bool,
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
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
