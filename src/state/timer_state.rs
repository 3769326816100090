//! Timer state value type and its pure transitions
//!
//! Every transition takes a state by value and returns a new one. Transitions
//! are total: a call whose precondition does not hold returns the input
//! unchanged. The engine layers guarded, error-raising operations on top.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{SessionModeConfig, SessionModeId};

/// The two alternating phases of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Work => f.write_str("work"),
            Self::Break => f.write_str("break"),
        }
    }
}

/// Snapshot of a work/break timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    pub mode: SessionModeId,
    pub phase: Phase,
    /// Seconds left in the current phase
    pub time_remaining: u32,
    /// Seconds spent running since the last reset
    pub total_elapsed: u32,
    /// Starts at 1
    pub current_cycle: u32,
}

impl TimerState {
    /// Fresh, inactive work phase for the given mode
    pub fn initialize(mode: SessionModeId, config: &SessionModeConfig) -> Self {
        Self {
            is_active: false,
            is_paused: false,
            mode,
            phase: Phase::Work,
            time_remaining: config.work_seconds(),
            total_elapsed: 0,
            current_cycle: 1,
        }
    }

    #[must_use]
    pub fn start(self) -> Self {
        if self.is_running() {
            return self;
        }
        Self {
            is_active: true,
            is_paused: false,
            ..self
        }
    }

    #[must_use]
    pub fn pause(self) -> Self {
        if !self.is_active {
            return self;
        }
        Self {
            is_active: false,
            is_paused: true,
            ..self
        }
    }

    #[must_use]
    pub fn resume(self) -> Self {
        if !self.is_paused {
            return self;
        }
        Self {
            is_active: true,
            is_paused: false,
            ..self
        }
    }

    /// Back to an inactive first work phase. Mode is kept.
    #[must_use]
    pub fn reset(self, initial_seconds: u32) -> Self {
        Self {
            is_active: false,
            is_paused: false,
            phase: Phase::Work,
            time_remaining: initial_seconds,
            total_elapsed: 0,
            current_cycle: 1,
            ..self
        }
    }

    /// Toggle the phase. The result is never running; callers restart explicitly.
    #[must_use]
    pub fn switch_phase(self, new_phase_seconds: u32) -> Self {
        Self {
            is_active: false,
            is_paused: false,
            phase: self.phase.toggled(),
            time_remaining: new_phase_seconds,
            ..self
        }
    }

    #[must_use]
    pub fn increment_cycle(self) -> Self {
        Self {
            current_cycle: self.current_cycle.saturating_add(1),
            ..self
        }
    }

    /// Negative input clamps to zero
    #[must_use]
    pub fn update_time_remaining(self, seconds: i64) -> Self {
        Self {
            time_remaining: seconds.clamp(0, u32::MAX as i64) as u32,
            ..self
        }
    }

    #[must_use]
    pub fn add_elapsed(self, seconds: u32) -> Self {
        Self {
            total_elapsed: self.total_elapsed.saturating_add(seconds),
            ..self
        }
    }

    pub fn can_start(&self) -> bool {
        !self.is_active && self.time_remaining > 0
    }

    pub fn can_pause(&self) -> bool {
        self.is_active
    }

    pub fn can_resume(&self) -> bool {
        self.is_paused
    }

    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused
    }

    /// Share of the phase already spent, in [0, 100]
    pub fn progress_percent(&self, initial_seconds: u32) -> f64 {
        if initial_seconds == 0 {
            return 0.0;
        }
        let initial = f64::from(initial_seconds);
        let spent = initial - f64::from(self.time_remaining);
        (spent / initial * 100.0).clamp(0.0, 100.0)
    }

    /// Structural invariants a snapshot must hold before it is adopted
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.is_active && self.is_paused {
            return Err("state cannot be both active and paused".to_string());
        }
        if self.current_cycle == 0 {
            return Err("cycle numbering starts at 1".to_string());
        }
        Ok(())
    }
}
