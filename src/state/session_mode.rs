//! Session mode configuration and presets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimerError};

/// The fixed set of session modes a user can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionModeId {
    Pomodoro,
    DeepWork,
    Zen,
    Custom,
}

impl SessionModeId {
    pub const ALL: [SessionModeId; 4] = [
        SessionModeId::Pomodoro,
        SessionModeId::DeepWork,
        SessionModeId::Zen,
        SessionModeId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pomodoro => "pomodoro",
            Self::DeepWork => "deep-work",
            Self::Zen => "zen",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SessionModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionModeId {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TimerError::InvalidSessionMode(format!("unknown mode id '{}'", s)))
    }
}

/// Raw, unvalidated shape of a session mode as it appears in storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionModeConfig {
    id: SessionModeId,
    name: String,
    #[serde(default)]
    description: String,
    default_work_duration: u32,
    default_break_duration: u32,
    #[serde(default)]
    max_work_duration: Option<u32>,
    #[serde(default)]
    max_break_duration: Option<u32>,
    #[serde(default)]
    is_customizable: bool,
}

/// Work/break durations and display metadata for one session mode.
///
/// Instances can only be obtained through validated construction, so any
/// `SessionModeConfig` held by the engine already satisfies its invariants.
/// Durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSessionModeConfig", into = "RawSessionModeConfig")]
pub struct SessionModeConfig {
    id: SessionModeId,
    name: String,
    description: String,
    default_work_duration: u32,
    default_break_duration: u32,
    max_work_duration: Option<u32>,
    max_break_duration: Option<u32>,
    is_customizable: bool,
}

impl SessionModeConfig {
    /// Build and validate a session mode configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionModeId,
        name: impl Into<String>,
        description: impl Into<String>,
        default_work_duration: u32,
        default_break_duration: u32,
        max_work_duration: Option<u32>,
        max_break_duration: Option<u32>,
        is_customizable: bool,
    ) -> Result<Self> {
        let config = Self {
            id,
            name: name.into(),
            description: description.into(),
            default_work_duration,
            default_break_duration,
            max_work_duration,
            max_break_duration,
            is_customizable,
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration for a mode
    pub fn preset(id: SessionModeId) -> Self {
        let (name, description, work, brk, max_work, max_break) = match id {
            SessionModeId::Pomodoro => (
                "Pomodoro",
                "Short focus sprints with regular breaks",
                25,
                5,
                Some(60),
                Some(30),
            ),
            SessionModeId::DeepWork => (
                "Deep Work",
                "Long uninterrupted focus blocks",
                50,
                10,
                Some(120),
                Some(30),
            ),
            SessionModeId::Zen => (
                "Zen",
                "Open-ended focus without scheduled breaks",
                15,
                0,
                Some(180),
                None,
            ),
            SessionModeId::Custom => (
                "Custom",
                "Your own work and break lengths",
                30,
                5,
                Some(240),
                Some(60),
            ),
        };

        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            default_work_duration: work,
            default_break_duration: brk,
            max_work_duration: max_work,
            max_break_duration: max_break,
            is_customizable: true,
        }
    }

    /// Copy of this mode with user-chosen durations.
    ///
    /// Fails if the mode is not customizable or a duration exceeds its maximum.
    /// A break-less mode stays break-less.
    pub fn with_durations(&self, work_minutes: u32, break_minutes: u32) -> Result<Self> {
        if !self.is_customizable {
            return Err(TimerError::InvalidSessionMode(format!(
                "mode '{}' does not allow custom durations",
                self.id
            )));
        }
        if self.is_open() && break_minutes != 0 {
            return Err(TimerError::InvalidSessionMode(format!(
                "mode '{}' has no break phase",
                self.id
            )));
        }

        let mut config = self.clone();
        config.default_work_duration = work_minutes;
        config.default_break_duration = break_minutes;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant of the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TimerError::InvalidSessionMode(
                "mode name must not be empty".to_string(),
            ));
        }
        Self::check_bound("work", self.default_work_duration, self.max_work_duration)?;
        Self::check_bound("break", self.default_break_duration, self.max_break_duration)?;
        Ok(())
    }

    fn check_bound(label: &str, value: u32, max: Option<u32>) -> Result<()> {
        match max {
            Some(0) => Err(TimerError::InvalidSessionMode(format!(
                "maximum {} duration must be at least 1 minute",
                label
            ))),
            Some(max) if value > max => Err(TimerError::InvalidSessionMode(format!(
                "{} duration {}min exceeds maximum {}min",
                label, value, max
            ))),
            _ => Ok(()),
        }
    }

    pub fn id(&self) -> SessionModeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_work_duration(&self) -> u32 {
        self.default_work_duration
    }

    pub fn default_break_duration(&self) -> u32 {
        self.default_break_duration
    }

    pub fn max_work_duration(&self) -> Option<u32> {
        self.max_work_duration
    }

    pub fn max_break_duration(&self) -> Option<u32> {
        self.max_break_duration
    }

    pub fn is_customizable(&self) -> bool {
        self.is_customizable
    }

    /// Break-less mode: a zero break duration
    pub fn is_open(&self) -> bool {
        self.default_break_duration == 0
    }

    pub fn work_seconds(&self) -> u32 {
        self.default_work_duration.saturating_mul(60)
    }

    pub fn break_seconds(&self) -> u32 {
        self.default_break_duration.saturating_mul(60)
    }
}

impl TryFrom<RawSessionModeConfig> for SessionModeConfig {
    type Error = TimerError;

    fn try_from(raw: RawSessionModeConfig) -> Result<Self> {
        Self::new(
            raw.id,
            raw.name,
            raw.description,
            raw.default_work_duration,
            raw.default_break_duration,
            raw.max_work_duration,
            raw.max_break_duration,
            raw.is_customizable,
        )
    }
}

impl From<SessionModeConfig> for RawSessionModeConfig {
    fn from(config: SessionModeConfig) -> Self {
        Self {
            id: config.id,
            name: config.name,
            description: config.description,
            default_work_duration: config.default_work_duration,
            default_break_duration: config.default_break_duration,
            max_work_duration: config.max_work_duration,
            max_break_duration: config.max_break_duration,
            is_customizable: config.is_customizable,
        }
    }
}
