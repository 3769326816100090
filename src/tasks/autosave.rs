//! Periodic snapshot background task

use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::{services::save_snapshot, state::AppState};

/// Background task that periodically writes the engine snapshot to disk
pub async fn autosave_task(state: Arc<AppState>, path: PathBuf, every: Duration) {
    info!("Starting autosave task ({}s, {})", every.as_secs(), path.display());

    let mut ticker = interval(every);
    // the first tick completes immediately; the startup state needs no save
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let export = match state.export() {
            Ok(export) => export,
            Err(e) => {
                debug!("Skipping autosave: {}", e);
                continue;
            }
        };

        if let Err(e) = save_snapshot(&path, &export).await {
            warn!("Autosave failed: {:#}", e);
        }
    }
}
