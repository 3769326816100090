//! Stateful timer engine driven by a host clock and frame scheduler

use tracing::{debug, info, trace, warn};

use super::events::{EventBus, EventKind, SubscriptionId, TimerEvent};
use super::host::{FrameId, Host};
use crate::error::{Result, TimerError};
use crate::state::{Phase, SessionModeConfig, SessionModeId, TimerState, TimerStateExport};

/// Minimum spacing between two emitted `tick` events
pub const TICK_THROTTLE_MS: i64 = 100;

/// Everything that exists only once a session mode has been configured
#[derive(Debug)]
struct Session {
    config: SessionModeConfig,
    state: TimerState,
    /// Clock reading the current phase is measured from while running
    start_time: Option<i64>,
    /// Exact phase time already spent, captured at pause
    paused_elapsed_ms: Option<i64>,
    completed_cycles: u32,
}

impl Session {
    fn new(config: SessionModeConfig, state: TimerState) -> Self {
        Self {
            config,
            state,
            start_time: None,
            paused_elapsed_ms: None,
            completed_cycles: 0,
        }
    }

    fn phase_seconds(&self) -> u32 {
        phase_seconds(&self.config, self.state.phase)
    }

    /// Pick a start time so that the remaining time is preserved at `now`
    fn anchor(&mut self, now: i64) {
        let elapsed_ms = self.paused_elapsed_ms.take().unwrap_or_else(|| {
            i64::from(self.phase_seconds().saturating_sub(self.state.time_remaining)) * 1000
        });
        self.start_time = Some(now - elapsed_ms);
    }

    /// Recompute the remaining time from absolute elapsed time
    fn resync(&mut self, now: i64) -> u32 {
        let Some(start_time) = self.start_time else {
            return self.state.time_remaining;
        };

        let elapsed_seconds = (now - start_time).div_euclid(1000).max(0);
        let initial = i64::from(self.phase_seconds());
        let previous = self.state.time_remaining;

        self.state = self.state.update_time_remaining(initial - elapsed_seconds);
        if self.state.time_remaining < previous {
            self.state = self.state.add_elapsed(previous - self.state.time_remaining);
        }
        self.state.time_remaining
    }

    fn clear_timing(&mut self) {
        self.start_time = None;
        self.paused_elapsed_ms = None;
    }
}

fn phase_seconds(config: &SessionModeConfig, phase: Phase) -> u32 {
    match phase {
        Phase::Work => config.work_seconds(),
        Phase::Break => config.break_seconds(),
    }
}

/// Work/break timer that owns its state and schedules its own ticks.
///
/// The remaining time is always recomputed from a fixed start time rather
/// than decremented per callback, so late, throttled or suspended frames
/// never cause drift. Operations are guarded: calling one whose precondition
/// does not hold returns an error and leaves the engine untouched.
#[derive(Debug)]
pub struct TimerEngine<H: Host> {
    host: H,
    session: Option<Session>,
    events: EventBus,
    pending_frame: Option<FrameId>,
    last_tick_emit: Option<i64>,
    visibility_attached: bool,
    hidden: bool,
}

impl<H: Host> TimerEngine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            session: None,
            events: EventBus::new(),
            pending_frame: None,
            last_tick_emit: None,
            visibility_attached: false,
            hidden: false,
        }
    }

    /// Configure the engine with a session mode, discarding any previous state
    pub fn initialize_timer(&mut self, mode: SessionModeId, config: SessionModeConfig) -> Result<()> {
        config.validate()?;
        if mode != config.id() {
            return Err(TimerError::ModeMismatch {
                expected: config.id(),
                found: mode,
            });
        }

        self.cancel_pending_frame();
        self.last_tick_emit = None;
        let state = TimerState::initialize(mode, &config);
        info!(
            "Timer initialized: mode={}, work={}min, break={}min",
            mode,
            config.default_work_duration(),
            config.default_break_duration()
        );
        self.session = Some(Session::new(config, state));
        self.attach_visibility();
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        let now = self.host.now_ms();
        let session = self.session.as_mut().ok_or(TimerError::NotInitialized)?;
        if !session.state.can_start() {
            return Err(TimerError::InvalidStart);
        }

        session.anchor(now);
        session.state = session.state.start();
        let state = session.state;

        info!(
            "Timer started: phase={}, remaining={}s, cycle={}",
            state.phase, state.time_remaining, state.current_cycle
        );
        self.last_tick_emit = None;
        self.schedule_next_tick();
        self.emit(TimerEvent::Start { state });
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        let now = self.host.now_ms();
        let session = self.session.as_mut().ok_or(TimerError::NotInitialized)?;
        if !session.state.can_pause() {
            return Err(TimerError::InvalidPause);
        }

        session.resync(now);
        let phase_ms = i64::from(session.phase_seconds()) * 1000;
        session.paused_elapsed_ms = session
            .start_time
            .map(|start| (now - start).clamp(0, phase_ms));
        session.start_time = None;
        session.state = session.state.pause();
        let state = session.state;

        self.cancel_pending_frame();
        info!("Timer paused with {}s remaining", state.time_remaining);
        self.emit(TimerEvent::Pause { state });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        let now = self.host.now_ms();
        let session = self.session.as_mut().ok_or(TimerError::NotInitialized)?;
        if !session.state.can_resume() {
            return Err(TimerError::InvalidResume);
        }

        session.anchor(now);
        session.state = session.state.resume();
        let state = session.state;

        info!("Timer resumed with {}s remaining", state.time_remaining);
        self.last_tick_emit = None;
        self.schedule_next_tick();
        self.emit(TimerEvent::Resume { state });
        Ok(())
    }

    /// Back to a fresh first work phase of the configured mode
    pub fn reset(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(TimerError::NotInitialized)?;

        session.state = session.state.reset(session.config.work_seconds());
        session.clear_timing();
        session.completed_cycles = 0;
        let state = session.state;

        self.cancel_pending_frame();
        self.last_tick_emit = None;
        info!("Timer reset to {}s", state.time_remaining);
        self.emit(TimerEvent::Reset { state });
        Ok(())
    }

    /// End the current phase now, as if its time had run out
    pub fn complete(&mut self) -> Result<()> {
        let now = self.host.now_ms();
        let session = self.session.as_mut().ok_or(TimerError::NotInitialized)?;
        if !(session.state.is_active || session.state.is_paused) {
            return Err(TimerError::InvalidComplete);
        }

        session.resync(now);
        self.cancel_pending_frame();
        info!("Phase completed manually");
        self.complete_phase();
        Ok(())
    }

    /// Deliver a frame callback previously requested from the host.
    ///
    /// Ids other than the single outstanding request are ignored.
    pub fn run_frame(&mut self, id: FrameId) {
        if self.pending_frame != Some(id) {
            trace!("Ignoring stale frame {:?}", id);
            return;
        }
        self.pending_frame = None;
        self.tick();
    }

    /// React to the host page/window becoming hidden or visible
    pub fn handle_visibility_change(&mut self, is_visible: bool) {
        if !self.visibility_attached {
            return;
        }
        self.hidden = !is_visible;

        let running = self
            .session
            .as_ref()
            .map_or(false, |session| session.state.is_running());
        if !running {
            return;
        }

        if is_visible {
            debug!("Host visible again, resynchronizing timer");
            self.last_tick_emit = None;
            self.tick();
        } else {
            debug!("Host hidden, suspending frame callbacks");
            self.cancel_pending_frame();
        }
    }

    pub fn export_state(&self) -> Result<TimerStateExport> {
        let session = self.session.as_ref().ok_or(TimerError::NotInitialized)?;
        Ok(TimerStateExport {
            timer_state: session.state,
            session_mode_config: session.config.clone(),
            start_time: session.start_time,
        })
    }

    /// Adopt a previously exported snapshot.
    ///
    /// A running snapshot is resynchronized against the current clock, so the
    /// time spent between export and restore is accounted for. A start time
    /// later than its `timeRemaining` allows (including one ahead of the
    /// clock) is rejected, so a restore can never rewind the countdown.
    pub fn restore_state(&mut self, export: TimerStateExport) -> Result<()> {
        export.validate()?;

        let now = self.host.now_ms();
        let TimerStateExport {
            timer_state,
            session_mode_config,
            start_time,
        } = export;

        let mut session = Session::new(session_mode_config, timer_state);
        if timer_state.is_running() {
            // time_remaining can only have been reached if the phase started
            // at least this long before now
            let spent = session.phase_seconds().saturating_sub(timer_state.time_remaining);
            let latest = now - i64::from(spent) * 1000;
            if let Some(start) = start_time.filter(|start| *start > latest) {
                return Err(TimerError::InvalidTimerState(format!(
                    "start time {}ms is inconsistent with {}s remaining at {}ms",
                    start, timer_state.time_remaining, now
                )));
            }
            session.start_time = start_time;
        }

        self.cancel_pending_frame();
        self.last_tick_emit = None;
        info!(
            "Timer state restored: mode={}, phase={}, remaining={}s, running={}",
            timer_state.mode,
            timer_state.phase,
            timer_state.time_remaining,
            timer_state.is_running()
        );
        self.session = Some(session);
        self.attach_visibility();

        if timer_state.is_running() {
            self.tick();
        }
        Ok(())
    }

    /// Cancel pending work, drop subscribers and return to uninitialized.
    ///
    /// Safe to call any number of times.
    pub fn destroy(&mut self) {
        self.cancel_pending_frame();
        self.events.clear();
        if self.visibility_attached {
            self.host.detach_visibility();
            self.visibility_attached = false;
        }
        if self.session.take().is_some() {
            info!("Timer engine destroyed");
        }
        self.last_tick_emit = None;
        self.hidden = false;
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&TimerEvent) -> anyhow::Result<()> + Send + 'static,
    {
        self.events.subscribe(kind, Box::new(handler))
    }

    pub fn off(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        self.events.unsubscribe(kind, id)
    }

    /// Copy of the current state, if initialized
    pub fn current_state(&self) -> Option<TimerState> {
        self.session.as_ref().map(|session| session.state)
    }

    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |session| session.state.is_active)
    }

    pub fn is_paused(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |session| session.state.is_paused)
    }

    pub fn session_mode(&self) -> Option<&SessionModeConfig> {
        self.session.as_ref().map(|session| &session.config)
    }

    /// Configured length of the current phase
    pub fn phase_seconds(&self) -> Option<u32> {
        self.session.as_ref().map(Session::phase_seconds)
    }

    pub fn progress_percent(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |session| {
            session.state.progress_percent(session.phase_seconds())
        })
    }

    /// Cycles completed since the last reset
    pub fn completed_cycles(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |session| session.completed_cycles)
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn tick(&mut self) {
        let now = self.host.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.state.is_running() {
            return;
        }

        let remaining = session.resync(now);
        let state = session.state;
        let progress = state.progress_percent(session.phase_seconds());
        trace!("Frame: remaining={}s", remaining);

        let due = self
            .last_tick_emit
            .map_or(true, |last| now - last >= TICK_THROTTLE_MS);
        if due {
            self.last_tick_emit = Some(now);
            debug!("Tick: {}s remaining in {} phase", remaining, state.phase);
            self.emit(TimerEvent::Tick {
                time_remaining: state.time_remaining,
                total_elapsed: state.total_elapsed,
                phase: state.phase,
                progress,
            });
        }

        if remaining == 0 {
            self.complete_phase();
        } else {
            self.schedule_next_tick();
        }
    }

    /// Close out the current phase and prepare, but never start, the next one.
    ///
    /// In a break-less mode the work phase restarts in place: the cycle
    /// number advances and `total_elapsed` carries over, while the phase
    /// time goes back to the full work duration.
    fn complete_phase(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let phase = session.state.phase;
        let open = session.config.is_open();
        let mut events = vec![TimerEvent::Complete {
            phase,
            cycle_completed: phase == Phase::Work && open,
        }];

        session.state = session.state.pause();
        session.clear_timing();

        match phase {
            Phase::Work if !open => {
                session.state = session.state.switch_phase(session.config.break_seconds());
                events.push(TimerEvent::PhaseChange {
                    from: Phase::Work,
                    to: Phase::Break,
                    cycle: session.state.current_cycle,
                });
            }
            Phase::Work => {
                let finished = session.state.current_cycle;
                let next = session.state.increment_cycle();
                let mut fresh = next.reset(session.config.work_seconds());
                fresh.current_cycle = next.current_cycle;
                fresh.total_elapsed = next.total_elapsed;
                session.state = fresh;
                session.completed_cycles += 1;
                events.push(TimerEvent::CycleComplete {
                    cycle: finished,
                    total_cycles: session.completed_cycles,
                });
            }
            Phase::Break => {
                let finished = session.state.current_cycle;
                session.state = session
                    .state
                    .increment_cycle()
                    .switch_phase(session.config.work_seconds());
                session.completed_cycles += 1;
                events.push(TimerEvent::PhaseChange {
                    from: Phase::Break,
                    to: Phase::Work,
                    cycle: session.state.current_cycle,
                });
                events.push(TimerEvent::CycleComplete {
                    cycle: finished,
                    total_cycles: session.completed_cycles,
                });
            }
        }

        let state = session.state;
        info!(
            "{} phase complete; next: {} phase, {}s, cycle {}",
            phase, state.phase, state.time_remaining, state.current_cycle
        );
        self.last_tick_emit = None;
        for event in events {
            self.emit(event);
        }
    }

    /// No frames are requested while the host is hidden; becoming visible
    /// again resynchronizes and schedules.
    fn schedule_next_tick(&mut self) {
        if self.pending_frame.is_some() || self.hidden {
            return;
        }
        self.pending_frame = Some(self.host.request_frame());
    }

    fn cancel_pending_frame(&mut self) {
        if let Some(id) = self.pending_frame.take() {
            self.host.cancel_frame(id);
        }
    }

    fn attach_visibility(&mut self) {
        if !self.visibility_attached {
            self.host.attach_visibility();
            self.visibility_attached = true;
        }
    }

    fn emit(&mut self, event: TimerEvent) {
        if self.events.subscriber_count(event.kind()) == 0 {
            return;
        }
        self.events.emit(&event);
    }
}

impl<H: Host> Drop for TimerEngine<H> {
    fn drop(&mut self) {
        if self.pending_frame.is_some() {
            warn!("Timer engine dropped with a pending frame; cancelling it");
        }
        self.destroy();
    }
}
