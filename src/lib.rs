//! Focus Timer - a drift-free work/break timer engine
//!
//! This library provides the pure timer state model, the engine that drives
//! it against a host clock, and the pieces of a small local daemon that
//! exposes the engine over HTTP and persists it between runs.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use engine::{EventKind, TimerEngine, TimerEvent};
pub use error::{Result, TimerError};
pub use state::{AppState, Phase, SessionModeConfig, SessionModeId, TimerState, TimerStateExport};
pub use utils::signals::shutdown_signal;
