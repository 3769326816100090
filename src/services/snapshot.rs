//! Timer snapshot persistence

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tracing::{debug, info};

use crate::state::TimerStateExport;

/// Write a snapshot to disk, replacing any previous one.
///
/// The data goes to a sibling temp file first and is then renamed into place,
/// so a crash mid-write never leaves a truncated snapshot behind.
pub async fn save_snapshot(path: &Path, export: &TimerStateExport) -> anyhow::Result<()> {
    let json = export.to_json()?;
    let tmp = temp_path(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

    debug!("Snapshot saved to {}", path.display());
    Ok(())
}

/// Read a snapshot from disk. A missing file is not an error.
pub async fn load_snapshot(path: &Path) -> anyhow::Result<Option<TimerStateExport>> {
    let data = match fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No snapshot at {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let export = TimerStateExport::from_json(&data)?;
    info!("Snapshot loaded from {}", path.display());
    Ok(Some(export))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}
