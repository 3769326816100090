//! Host primitives the engine is driven by
//!
//! The engine needs three things from its host: a monotonic millisecond
//! clock, a cancelable "call me on the next frame" request, and visibility
//! change notifications. Frames are delivered back by the host calling
//! [`TimerEngine::run_frame`](super::TimerEngine::run_frame) with the id it
//! handed out.

use std::sync::{
    atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Instant;

use chrono::Utc;

/// Identifier of a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Monotonic high-resolution clock, in milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// One-shot frame callback scheduling
pub trait FrameScheduler {
    fn request_frame(&self) -> FrameId;
    fn cancel_frame(&self, id: FrameId);
}

/// Hooks called when the engine starts or stops listening for visibility changes
pub trait VisibilityListener {
    fn attach_visibility(&self) {}
    fn detach_visibility(&self) {}
}

/// Everything the engine needs from its environment
pub trait Host: Clock + FrameScheduler + VisibilityListener {}

impl<T: Clock + FrameScheduler + VisibilityListener> Host for T {}

/// Single outstanding frame request shared between a host and its driver
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    next_id: Arc<AtomicU64>,
    pending: Arc<Mutex<Option<FrameId>>>,
    requested: Arc<AtomicU64>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request, replacing any previous one
    pub fn request(&self) -> FrameId {
        let id = FrameId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.requested.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(id);
        }
        id
    }

    /// Drop the request if it is still the pending one
    pub fn cancel(&self, id: FrameId) {
        if let Ok(mut pending) = self.pending.lock() {
            if *pending == Some(id) {
                *pending = None;
            }
        }
    }

    /// Claim the pending request for delivery
    pub fn take(&self) -> Option<FrameId> {
        self.pending.lock().ok().and_then(|mut pending| pending.take())
    }

    pub fn pending(&self) -> Option<FrameId> {
        self.pending.lock().ok().and_then(|pending| *pending)
    }

    /// Total number of requests made so far
    pub fn requested_count(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Clock anchored to the Unix epoch at creation and advanced by `Instant`.
///
/// Readings never go backwards within a process and remain comparable with
/// readings taken by another process, which keeps exported start times usable.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch_ms: i64,
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch_ms: Utc::now().timestamp_millis(),
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

/// Host for async runtimes: system clock plus a frame slot drained by a task
#[derive(Debug, Clone, Default)]
pub struct TokioHost {
    clock: SystemClock,
    frames: FrameSlot,
}

impl TokioHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the frame driver task polls
    pub fn frames(&self) -> FrameSlot {
        self.frames.clone()
    }
}

impl Clock for TokioHost {
    fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

impl FrameScheduler for TokioHost {
    fn request_frame(&self) -> FrameId {
        self.frames.request()
    }

    fn cancel_frame(&self, id: FrameId) {
        self.frames.cancel(id);
    }
}

impl VisibilityListener for TokioHost {
    fn attach_visibility(&self) {
        tracing::debug!("Visibility notifications attached");
    }

    fn detach_visibility(&self) {
        tracing::debug!("Visibility notifications detached");
    }
}

/// Deterministic host for tests and simulations.
///
/// Clones share the same clock and frame slot, so a test can keep one handle
/// while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualHost {
    now: Arc<AtomicI64>,
    frames: FrameSlot,
    visibility_attached: Arc<AtomicBool>,
}

impl ManualHost {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
            ..Self::default()
        }
    }

    pub fn set_now(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn pending_frame(&self) -> Option<FrameId> {
        self.frames.pending()
    }

    /// Claim the pending frame as the host would right before delivering it
    pub fn take_frame(&self) -> Option<FrameId> {
        self.frames.take()
    }

    pub fn requested_frames(&self) -> u64 {
        self.frames.requested_count()
    }

    pub fn visibility_attached(&self) -> bool {
        self.visibility_attached.load(Ordering::SeqCst)
    }
}

impl Clock for ManualHost {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl FrameScheduler for ManualHost {
    fn request_frame(&self) -> FrameId {
        self.frames.request()
    }

    fn cancel_frame(&self, id: FrameId) {
        self.frames.cancel(id);
    }
}

impl VisibilityListener for ManualHost {
    fn attach_visibility(&self) {
        self.visibility_attached.store(true, Ordering::SeqCst);
    }

    fn detach_visibility(&self) {
        self.visibility_attached.store(false, Ordering::SeqCst);
    }
}
