//! Shared daemon state that owns the timer engine

use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{SessionModeConfig, TimerState, TimerStateExport};
use crate::{
    engine::{EventKind, FrameSlot, TimerEngine, TimerEvent, TokioHost},
    error::TimerError,
};

/// Errors surfaced by daemon state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("failed to lock timer engine: {0}")]
    Lock(String),
}

/// Main daemon state: the single engine instance plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// The timer engine, driven by the frame loop task
    pub engine: Mutex<TimerEngine<TokioHost>>,
    /// Frame requests the engine makes, drained by the frame loop task
    pub frames: FrameSlot,
    /// Where snapshots are saved, if anywhere
    pub state_file: Option<PathBuf>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Every engine event is forwarded here
    pub event_tx: broadcast::Sender<TimerEvent>,
}

impl AppState {
    /// Create the state with an engine initialized for the given mode
    pub fn new(
        port: u16,
        host: String,
        state_file: Option<PathBuf>,
        mode: SessionModeConfig,
    ) -> Result<Self, StateError> {
        let (event_tx, _) = broadcast::channel(100);
        let timer_host = TokioHost::new();
        let frames = timer_host.frames();

        let mut engine = TimerEngine::new(timer_host);
        engine.initialize_timer(mode.id(), mode)?;
        for kind in EventKind::ALL {
            let tx = event_tx.clone();
            engine.on(kind, move |event| {
                // no receivers is fine; nobody is listening yet
                let _ = tx.send(event.clone());
                Ok(())
            });
        }

        Ok(Self {
            engine: Mutex::new(engine),
            frames,
            state_file,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            event_tx,
        })
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TimerEngine<TokioHost>>, StateError> {
        self.engine
            .lock()
            .map_err(|e| StateError::Lock(e.to_string()))
    }

    /// Run an engine operation, record it as the last action and return the new state
    pub fn apply<F>(&self, action: &str, op: F) -> Result<Option<TimerState>, StateError>
    where
        F: FnOnce(&mut TimerEngine<TokioHost>) -> crate::error::Result<()>,
    {
        let mut engine = self.lock_engine()?;
        op(&mut engine)?;
        let state = engine.current_state();
        drop(engine); // Release the lock early

        info!("Action '{}' applied", action);
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
        Ok(state)
    }

    /// Read from the engine without changing it
    pub fn inspect<T, F>(&self, f: F) -> Result<T, StateError>
    where
        F: FnOnce(&TimerEngine<TokioHost>) -> T,
    {
        let engine = self.lock_engine()?;
        Ok(f(&engine))
    }

    /// Deliver the pending frame, if any. Returns whether one was delivered.
    pub fn run_pending_frame(&self) -> Result<bool, StateError> {
        let Some(id) = self.frames.take() else {
            return Ok(false);
        };
        self.lock_engine()?.run_frame(id);
        Ok(true)
    }

    pub fn set_visibility(&self, visible: bool) -> Result<Option<TimerState>, StateError> {
        let mut engine = self.lock_engine()?;
        engine.handle_visibility_change(visible);
        debug!("Visibility set to {}", visible);
        Ok(engine.current_state())
    }

    pub fn export(&self) -> Result<TimerStateExport, StateError> {
        Ok(self.lock_engine()?.export_state()?)
    }

    pub fn restore(&self, export: TimerStateExport) -> Result<(), StateError> {
        self.lock_engine()?.restore_state(export)?;
        Ok(())
    }

    /// Tear the engine down ahead of process exit
    pub fn shutdown(&self) -> Result<(), StateError> {
        self.lock_engine()?.destroy();
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
