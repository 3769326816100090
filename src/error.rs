//! Error types for timer engine operations

use thiserror::Error;

use crate::state::SessionModeId;

/// Errors raised by the timer engine.
///
/// Two families exist: transition guard violations (the caller asked for an
/// operation whose precondition does not hold) and validation errors (the
/// caller supplied a configuration or snapshot the engine refuses to adopt).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer cannot be started: already running or no time remaining")]
    InvalidStart,

    #[error("timer cannot be paused: it is not running")]
    InvalidPause,

    #[error("timer cannot be resumed: it is not paused")]
    InvalidResume,

    #[error("timer cannot be completed: no phase is in progress")]
    InvalidComplete,

    #[error("timer has not been initialized with a session mode")]
    NotInitialized,

    #[error("invalid session mode configuration: {0}")]
    InvalidSessionMode(String),

    #[error("invalid timer state: {0}")]
    InvalidTimerState(String),

    #[error("session mode mismatch: expected {expected}, found {found}")]
    ModeMismatch {
        expected: SessionModeId,
        found: SessionModeId,
    },
}

impl TimerError {
    /// True for errors caused by calling an operation in the wrong state
    pub fn is_guard_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidStart
                | Self::InvalidPause
                | Self::InvalidResume
                | Self::InvalidComplete
                | Self::NotInitialized
        )
    }

    /// True for errors caused by structurally invalid input
    pub fn is_validation_error(&self) -> bool {
        !self.is_guard_violation()
    }
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, TimerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_disjoint() {
        let guards = [
            TimerError::InvalidStart,
            TimerError::InvalidPause,
            TimerError::InvalidResume,
            TimerError::InvalidComplete,
            TimerError::NotInitialized,
        ];
        for err in guards {
            assert!(err.is_guard_violation());
            assert!(!err.is_validation_error());
        }

        let validation = [
            TimerError::InvalidSessionMode("bad".into()),
            TimerError::InvalidTimerState("bad".into()),
            TimerError::ModeMismatch {
                expected: SessionModeId::Zen,
                found: SessionModeId::Pomodoro,
            },
        ];
        for err in validation {
            assert!(err.is_validation_error());
        }
    }

    #[test]
    fn mismatch_message_names_both_modes() {
        let err = TimerError::ModeMismatch {
            expected: SessionModeId::DeepWork,
            found: SessionModeId::Zen,
        };
        assert_eq!(
            err.to_string(),
            "session mode mismatch: expected deep-work, found zen"
        );
    }
}
