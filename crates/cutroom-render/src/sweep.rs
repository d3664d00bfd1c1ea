//! Housekeeping sweep for stale job artifacts.
//!
//! Removes status records and their rendered outputs once they age past the
//! retention window. Records still `rendering` are never touched, whatever
//! their age.

use std::time::SystemTime;

use cutroom_models::{JobState, JobStatus};
use tracing::{info, warn};

use crate::config::RenderConfig;
use crate::error::RenderResult;

/// Run one sweep pass, returning the number of jobs removed.
pub async fn sweep_stale(config: &RenderConfig) -> RenderResult<usize> {
    let mut entries = match tokio::fs::read_dir(&config.status_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let status: JobStatus = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(status) => status,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable status record; skipping");
                    continue;
                }
            },
            Err(_) => continue,
        };

        // A job still rendering owns its artifacts.
        if status.status == JobState::Rendering {
            continue;
        }

        let age = entry
            .metadata()
            .await?
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < config.retention {
            continue;
        }

        if let Some(ref filename) = status.filename {
            let output = config.output_dir.join(filename);
            if let Err(e) = tokio::fs::remove_file(&output).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %output.display(), error = %e, "Failed to remove stale output");
                }
            }
        }

        tokio::fs::remove_file(&path).await?;
        removed += 1;
    }

    if removed > 0 {
        info!(removed, "Swept stale render artifacts");
    }
    Ok(removed)
}
