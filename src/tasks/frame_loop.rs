//! Frame delivery background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, trace};

use crate::state::AppState;

/// Background task that plays the role of the host's paint loop.
///
/// On every interval tick the pending frame request, if any, is delivered to
/// the engine. Late or skipped ticks only delay updates: the engine computes
/// remaining time from its start time, not from how many frames ran.
pub async fn frame_loop_task(state: Arc<AppState>, frame_interval: Duration) {
    info!("Starting frame loop task ({}ms frames)", frame_interval.as_millis());

    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match state.run_pending_frame() {
            Ok(true) => trace!("Frame delivered"),
            Ok(false) => {}
            Err(e) => {
                error!("Failed to deliver frame: {}", e);
            }
        }
    }
}
