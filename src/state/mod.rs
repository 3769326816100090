//! State management module
//!
//! Pure timer state, session mode configuration, persistence snapshots, and
//! the shared daemon state that owns an engine.

pub mod app_state;
pub mod export;
pub mod session_mode;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use export::TimerStateExport;
pub use session_mode::{SessionModeConfig, SessionModeId};
pub use timer_state::{Phase, TimerState};
