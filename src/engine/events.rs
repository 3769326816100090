//! Typed timer events and their subscriber table

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::warn;

use crate::state::{Phase, TimerState};

/// Event names subscribers can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Start,
    Pause,
    Resume,
    Reset,
    Tick,
    Complete,
    PhaseChange,
    CycleComplete,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Start,
        EventKind::Pause,
        EventKind::Resume,
        EventKind::Reset,
        EventKind::Tick,
        EventKind::Complete,
        EventKind::PhaseChange,
        EventKind::CycleComplete,
    ];

    fn slot(self) -> usize {
        match self {
            Self::Start => 0,
            Self::Pause => 1,
            Self::Resume => 2,
            Self::Reset => 3,
            Self::Tick => 4,
            Self::Complete => 5,
            Self::PhaseChange => 6,
            Self::CycleComplete => 7,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::Tick => "tick",
            Self::Complete => "complete",
            Self::PhaseChange => "phaseChange",
            Self::CycleComplete => "cycleComplete",
        };
        f.write_str(name)
    }
}

/// Lifecycle notification emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    Start { state: TimerState },
    Pause { state: TimerState },
    Resume { state: TimerState },
    Reset { state: TimerState },
    #[serde(rename_all = "camelCase")]
    Tick {
        time_remaining: u32,
        total_elapsed: u32,
        phase: Phase,
        progress: f64,
    },
    #[serde(rename_all = "camelCase")]
    Complete { phase: Phase, cycle_completed: bool },
    PhaseChange { from: Phase, to: Phase, cycle: u32 },
    #[serde(rename_all = "camelCase")]
    CycleComplete { cycle: u32, total_cycles: u32 },
}

impl TimerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } => EventKind::Start,
            Self::Pause { .. } => EventKind::Pause,
            Self::Resume { .. } => EventKind::Resume,
            Self::Reset { .. } => EventKind::Reset,
            Self::Tick { .. } => EventKind::Tick,
            Self::Complete { .. } => EventKind::Complete,
            Self::PhaseChange { .. } => EventKind::PhaseChange,
            Self::CycleComplete { .. } => EventKind::CycleComplete,
        }
    }
}

/// Subscriber callback. Errors are logged and never reach the engine.
pub type EventHandler = Box<dyn FnMut(&TimerEvent) -> anyhow::Result<()> + Send>;

/// Returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    handler: EventHandler,
}

/// Dispatch table: one ordered subscriber list per event kind
#[derive(Default)]
pub struct EventBus {
    table: [Vec<Subscriber>; 8],
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.table[kind.slot()].push(Subscriber { id, handler });
        id
    }

    /// Returns false if the subscription was not found
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let subscribers = &mut self.table[kind.slot()];
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.table[kind.slot()].len()
    }

    pub fn clear(&mut self) {
        for subscribers in &mut self.table {
            subscribers.clear();
        }
    }

    /// Deliver an event to its subscribers in registration order.
    ///
    /// A handler that errors or panics is logged and skipped.
    pub fn emit(&mut self, event: &TimerEvent) {
        let kind = event.kind();
        for subscriber in &mut self.table[kind.slot()] {
            let outcome = catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        "Handler {:?} for '{}' event failed: {:#}",
                        subscriber.id, kind, e
                    );
                }
                Err(_) => {
                    warn!("Handler {:?} for '{}' event panicked", subscriber.id, kind);
                }
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind, &self.subscriber_count(kind));
        }
        map.finish()
    }
}
