//! External service adapters module
//!
//! This module contains the collaborators that sit around the engine, such as
//! the snapshot store used to persist the timer between runs.

pub mod snapshot;

// Re-export main functions
pub use snapshot::{load_snapshot, save_snapshot};
