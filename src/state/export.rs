//! Serializable engine snapshot handed to persistence

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Phase, SessionModeConfig, TimerState};
use crate::error::{Result, TimerError};

/// Everything needed to rebuild an equivalent engine elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStateExport {
    pub timer_state: TimerState,
    pub session_mode_config: SessionModeConfig,
    /// Clock reading (ms) the running phase is measured from; absent when idle
    #[serde(rename = "startTimeEpoch")]
    pub start_time: Option<i64>,
}

impl TimerStateExport {
    /// Check the snapshot is internally consistent
    pub fn validate(&self) -> Result<()> {
        self.session_mode_config.validate()?;
        self.timer_state
            .check_invariants()
            .map_err(TimerError::InvalidTimerState)?;

        if self.timer_state.mode != self.session_mode_config.id() {
            return Err(TimerError::ModeMismatch {
                expected: self.session_mode_config.id(),
                found: self.timer_state.mode,
            });
        }
        let phase_seconds = match self.timer_state.phase {
            Phase::Work => self.session_mode_config.work_seconds(),
            Phase::Break => self.session_mode_config.break_seconds(),
        };
        if self.timer_state.time_remaining > phase_seconds {
            return Err(TimerError::InvalidTimerState(format!(
                "{}s remaining exceeds the {}s {} phase",
                self.timer_state.time_remaining, phase_seconds, self.timer_state.phase
            )));
        }
        if self.timer_state.is_running() && self.start_time.is_none() {
            return Err(TimerError::InvalidTimerState(
                "running snapshot has no start time".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TimerError::InvalidTimerState(format!("failed to encode snapshot: {}", e)))
    }

    /// Parse and validate a stored snapshot.
    ///
    /// Problems inside `sessionModeConfig` are reported as
    /// `InvalidSessionMode`; everything else as `InvalidTimerState`.
    pub fn from_json(data: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(data)
            .map_err(|e| TimerError::InvalidTimerState(format!("malformed snapshot: {}", e)))?;
        let Some(object) = value.as_object_mut() else {
            return Err(TimerError::InvalidTimerState(
                "snapshot must be a JSON object".to_string(),
            ));
        };

        let config = object
            .remove("sessionModeConfig")
            .ok_or_else(|| TimerError::InvalidSessionMode("missing sessionModeConfig".to_string()))?;
        let session_mode_config: SessionModeConfig = serde_json::from_value(config)
            .map_err(|e| TimerError::InvalidSessionMode(e.to_string()))?;

        let state = object
            .remove("timerState")
            .ok_or_else(|| TimerError::InvalidTimerState("missing timerState".to_string()))?;
        let timer_state: TimerState = serde_json::from_value(state)
            .map_err(|e| TimerError::InvalidTimerState(format!("malformed timerState: {}", e)))?;

        let start_time: Option<i64> = match object.remove("startTimeEpoch") {
            Some(start) => serde_json::from_value(start).map_err(|e| {
                TimerError::InvalidTimerState(format!("malformed startTimeEpoch: {}", e))
            })?,
            None => None,
        };

        let export = Self {
            timer_state,
            session_mode_config,
            start_time,
        };
        export.validate()?;
        Ok(export)
    }
}
