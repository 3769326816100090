//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    error::Result,
    state::{SessionModeConfig, SessionModeId},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "focus-timer")]
#[command(about = "A drift-free focus timer with a local control API")]
#[command(version)]
pub struct Config {
    /// Port to bind the control API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Session mode: pomodoro, deep-work, zen or custom
    #[arg(short, long, default_value = "pomodoro")]
    pub mode: SessionModeId,

    /// Work phase length in minutes (overrides the mode default)
    #[arg(short, long)]
    pub work: Option<u32>,

    /// Break phase length in minutes (overrides the mode default)
    #[arg(short = 'b', long)]
    pub break_minutes: Option<u32>,

    /// JSON file the timer state is saved to and restored from
    #[arg(short, long)]
    pub state_file: Option<PathBuf>,

    /// Seconds between automatic state saves
    #[arg(long, default_value = "15")]
    pub autosave: u64,

    /// Host frame interval in milliseconds
    #[arg(long, default_value = "16")]
    pub frame_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Session mode preset with any duration overrides applied
    pub fn session_mode(&self) -> Result<SessionModeConfig> {
        let preset = SessionModeConfig::preset(self.mode);
        if self.work.is_none() && self.break_minutes.is_none() {
            return Ok(preset);
        }
        preset.with_durations(
            self.work.unwrap_or(preset.default_work_duration()),
            self.break_minutes.unwrap_or(preset.default_break_duration()),
        )
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave.max(1))
    }
}
