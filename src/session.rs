//! Session state owned by the controller.
//!
//! Presentation layers never mutate this; they receive clones as snapshots.

use crate::model::{ErrorRecord, Event, IngestionJob, JobDetail, JobId, Source, SourceId};
use serde::Serialize;

/// Tag captured before a job-detail fetch so a late result can be matched to the job it was
/// fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    job_id: JobId,
    epoch: u64,
}

impl DetailTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub sources: Vec<Source>,
    pub selected_source_id: Option<SourceId>,
    pub job: Option<IngestionJob>,
    pub events: Vec<Event>,
    pub errors: Vec<ErrorRecord>,
    pub busy: bool,
    pub message: String,
    /// RFC 3339 time of the last successful source-list refresh.
    pub last_refreshed_at: Option<String>,
    // Bumped whenever a different job becomes the held job.
    #[serde(skip)]
    job_epoch: u64,
}

impl SessionState {
    /// Look up the selected id in the current source list. A stale id yields `None`.
    pub fn selected_source(&self) -> Option<&Source> {
        let id = self.selected_source_id?;
        self.sources.iter().find(|s| s.id == id)
    }

    /// Replace the whole source list in boundary order; select the first entry if nothing is
    /// selected yet. An existing selection is left alone even if it no longer matches.
    pub fn replace_sources(&mut self, sources: Vec<Source>) {
        if self.selected_source_id.is_none() {
            self.selected_source_id = sources.first().map(|s| s.id);
        }
        self.sources = sources;
        self.last_refreshed_at = Some(now_rfc3339());
    }

    pub fn select_source(&mut self, id: SourceId) {
        self.selected_source_id = Some(id);
    }

    /// Start of a user action: clear the previous outcome and raise the busy flag.
    pub fn begin_action(&mut self) {
        self.message.clear();
        self.busy = true;
    }

    pub fn finish_action(&mut self) {
        self.busy = false;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Hold a freshly started job. Events and errors belong to the previous job and are dropped
    /// in the same step.
    pub fn commit_started_job(&mut self, job: IngestionJob) {
        self.job = Some(job);
        self.events.clear();
        self.errors.clear();
        self.job_epoch = self.job_epoch.wrapping_add(1);
    }

    /// Ticket for a detail fetch of the currently held job, if any.
    pub fn detail_ticket(&self) -> Option<DetailTicket> {
        self.job.as_ref().map(|job| DetailTicket {
            job_id: job.id,
            epoch: self.job_epoch,
        })
    }

    /// Ticket for watching `job_id` in place of whatever job was held before. Used when the
    /// operator points the console at an existing job; the held job stays visible until the
    /// detail commits.
    pub fn watch_job(&mut self, job_id: JobId) -> DetailTicket {
        self.job_epoch = self.job_epoch.wrapping_add(1);
        DetailTicket {
            job_id,
            epoch: self.job_epoch,
        }
    }

    /// Store job, events and errors together. Returns `false` and leaves state untouched when the
    /// ticket no longer matches the held job.
    pub fn commit_job_detail(&mut self, ticket: DetailTicket, detail: JobDetail) -> bool {
        // Any change of held job bumps the epoch, so a matching epoch means the ticket is for
        // the job currently held (or being watched).
        if ticket.epoch != self.job_epoch || detail.job.id != ticket.job_id {
            tracing::debug!(
                job_id = ticket.job_id,
                held = ?self.job.as_ref().map(|j| j.id),
                "discarding stale job detail"
            );
            return false;
        }
        self.job = Some(detail.job);
        self.events = detail.events;
        self.errors = detail.errors;
        true
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
