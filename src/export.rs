//! Snapshot export to JSON files.

use crate::session::SessionState;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Write `state` as pretty JSON to `path`.
pub fn export_json(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(state).context("serialize session state")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Default export filename for the current state, e.g. `ingest-job-42.json`.
pub fn default_export_name(state: &SessionState) -> String {
    match state.job.as_ref() {
        Some(job) => format!("ingest-job-{}.json", job.id),
        None => "ingest-sources.json".to_string(),
    }
}

/// Export into the current directory under the default name.
/// Returns the absolute path of the exported file.
pub fn export_to_current_dir(state: &SessionState) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(default_export_name(state));
    export_json(&path, state)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngestionJob, JobStatus};

    #[test]
    fn default_name_follows_held_job() {
        let mut state = SessionState::default();
        assert_eq!(default_export_name(&state), "ingest-sources.json");

        state.commit_started_job(IngestionJob {
            id: 42,
            source_id: Some(7),
            status: JobStatus::new("QUEUED"),
            started_at: None,
            finished_at: None,
            checkpoint: None,
        });
        assert_eq!(default_export_name(&state), "ingest-job-42.json");
    }

    #[test]
    fn export_writes_snapshot_without_internal_fields() {
        let dir = std::env::temp_dir().join(format!("ingest-console-export-{}", std::process::id()));
        let path = dir.join("nested").join("state.json");
        let mut state = SessionState::default();
        state.set_message("Created source #7");

        export_json(&path, &state).expect("export should succeed");

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("file should exist"))
                .expect("export should be json");
        assert_eq!(written["message"], "Created source #7");
        assert!(written.get("job_epoch").is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
