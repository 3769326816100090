//! Utility functions module
//!
//! This module contains process-level helpers used by the daemon binary.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
