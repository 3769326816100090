//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod autosave;
pub mod frame_loop;

// Re-export main functions
pub use autosave::autosave_task;
pub use frame_loop::frame_loop_task;
