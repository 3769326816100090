//! Timer engine module
//!
//! The stateful driver around the pure timer state: host primitives, the
//! typed event stream, and the engine itself.

pub mod events;
pub mod host;
pub mod timer_engine;

// Re-export main types
pub use events::{EventBus, EventHandler, EventKind, SubscriptionId, TimerEvent};
pub use host::{
    Clock, FrameId, FrameScheduler, FrameSlot, Host, ManualHost, SystemClock, TokioHost,
    VisibilityListener,
};
pub use timer_engine::{TimerEngine, TICK_THROTTLE_MS};
