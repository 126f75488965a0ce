//! Text summary builder for CLI output.
//!
//! The line helpers are shared with the TUI so both render entities the same way.

use crate::model::{ErrorRecord, Event, IngestionJob, Source};
use crate::session::SessionState;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn describe_source(source: &Source) -> String {
    format!("#{} — {} ({})", source.id, source.name, source.status)
}

pub(crate) fn describe_error(error: &ErrorRecord) -> String {
    format!(
        "{} — {} ({}, retryable: {})",
        error.code, error.message, error.severity, error.retryable
    )
}

pub(crate) fn describe_event_header(event: &Event) -> String {
    format!("{} {}", event.kind, event.ts)
}

/// Pretty JSON of an event payload, falling back to the compact form.
pub(crate) fn payload_lines(event: &Event) -> Vec<String> {
    serde_json::to_string_pretty(&event.payload)
        .unwrap_or_else(|_| event.payload.to_string())
        .lines()
        .map(str::to_string)
        .collect()
}

/// Label/value rows for the job panel, with placeholders for unset fields.
pub(crate) fn job_fields(job: &IngestionJob) -> Vec<(&'static str, String)> {
    vec![
        ("ID", job.id.to_string()),
        ("Status", job.status.to_string()),
        (
            "Started",
            job.started_at.clone().unwrap_or_else(|| "(not started)".into()),
        ),
        (
            "Finished",
            job.finished_at.clone().unwrap_or_else(|| "(not finished)".into()),
        ),
        (
            "Checkpoint",
            job.checkpoint.clone().unwrap_or_else(|| "(none)".into()),
        ),
    ]
}

pub(crate) fn build_text_summary(base_url: &str, state: &SessionState) -> TextSummary {
    let mut lines = Vec::new();
    lines.push(format!("API: {base_url}"));
    if let Some(at) = state.last_refreshed_at.as_deref() {
        lines.push(format!("Refreshed: {at}"));
    }

    lines.push(String::new());
    lines.push("Sources:".into());
    if state.sources.is_empty() {
        lines.push("  (No sources yet)".into());
    }
    for source in &state.sources {
        let marker = if state.selected_source_id == Some(source.id) {
            '>'
        } else {
            ' '
        };
        lines.push(format!("{marker} {}", describe_source(source)));
    }
    if let (Some(id), None) = (state.selected_source_id, state.selected_source()) {
        lines.push(format!("  (selected source #{id} not in list)"));
    }

    lines.push(String::new());
    lines.push("Latest job:".into());
    match state.job.as_ref() {
        None => lines.push("  No job yet. Start an ingestion.".into()),
        Some(job) => {
            for (label, value) in job_fields(job) {
                lines.push(format!("  {label}: {value}"));
            }
        }
    }

    lines.push(String::new());
    lines.push("Events:".into());
    if state.events.is_empty() {
        lines.push("  (none)".into());
    }
    for event in &state.events {
        lines.push(format!("  {}", describe_event_header(event)));
        for payload_line in payload_lines(event) {
            lines.push(format!("    {payload_line}"));
        }
    }

    lines.push(String::new());
    lines.push("Errors:".into());
    if state.errors.is_empty() {
        lines.push("  (none)".into());
    }
    for error in &state.errors {
        lines.push(format!("  {}", describe_error(error)));
    }

    if !state.message.is_empty() {
        lines.push(String::new());
        lines.push(state.message.clone());
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobStatus, Severity, SourceStatus};

    #[test]
    fn empty_state_shows_placeholders() {
        let summary = build_text_summary("http://127.0.0.1:8000", &SessionState::default());

        assert_eq!(summary.lines[0], "API: http://127.0.0.1:8000");
        assert!(summary.lines.iter().any(|l| l == "  (No sources yet)"));
        assert!(summary
            .lines
            .iter()
            .any(|l| l == "  No job yet. Start an ingestion."));
    }

    #[test]
    fn populated_state_marks_selection_and_lists_detail() {
        let mut state = SessionState::default();
        state.replace_sources(vec![
            Source {
                id: 7,
                name: "Sample CSV".into(),
                csv_path: None,
                status: SourceStatus::new("active"),
            },
            Source {
                id: 8,
                name: "Orders".into(),
                csv_path: None,
                status: SourceStatus::new("active"),
            },
        ]);
        state.commit_started_job(IngestionJob {
            id: 42,
            source_id: Some(7),
            status: JobStatus::new("RUNNING"),
            started_at: Some("2024-05-01T10:00:00".into()),
            finished_at: None,
            checkpoint: None,
        });
        state.events.push(Event {
            kind: "BATCH".into(),
            ts: "2024-05-01T10:00:02".into(),
            payload: serde_json::json!({"rows": 10}),
        });
        state.errors.push(ErrorRecord {
            code: "E_PARSE".into(),
            message: "bad row".into(),
            severity: Severity::new("ERROR"),
            retryable: false,
            ts: None,
        });
        state.set_message("Started job #42");

        let lines = build_text_summary("http://api", &state).lines;

        assert!(lines.contains(&"> #7 — Sample CSV (active)".to_string()));
        assert!(lines.contains(&"  #8 — Orders (active)".to_string()));
        assert!(lines.contains(&"  Finished: (not finished)".to_string()));
        assert!(lines.contains(&"  BATCH 2024-05-01T10:00:02".to_string()));
        assert!(lines.contains(&"      \"rows\": 10".to_string()));
        assert!(lines.contains(&"  E_PARSE — bad row (ERROR, retryable: false)".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Started job #42"));
    }

    #[test]
    fn stale_selection_is_called_out() {
        let mut state = SessionState::default();
        state.select_source(99);
        state.replace_sources(Vec::new());

        let lines = build_text_summary("http://api", &state).lines;
        assert!(lines.contains(&"  (selected source #99 not in list)".to_string()));
    }
}
