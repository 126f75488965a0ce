//! User-triggered actions over the session state.
//!
//! Each action raises the busy flag, runs its boundary calls in order, and turns the outcome
//! (success or failure) into the status message. Nothing here returns an error to the caller.

use super::controller::ConsoleEvent;
use super::refresh;
use crate::api::IngestionApi;
use crate::model::{JobId, NewSource, SourceId};
use crate::session::{DetailTicket, SessionState};
use crate::transport::ApiError;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionKind {
    Refresh,
    CreateSource,
    StartIngestion,
    WatchJob,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Refresh => "refresh",
            ActionKind::CreateSource => "create source",
            ActionKind::StartIngestion => "start ingestion",
            ActionKind::WatchJob => "watch job",
        })
    }
}

/// What an action did, for programmatic callers. The operator sees the status message instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActionOutcome {
    Completed,
    Failed(String),
    /// Preconditions not met; state was not touched.
    Skipped,
}

/// Owns the session state and the only entry points that mutate it.
pub(crate) struct Controller {
    api: IngestionApi,
    state: SessionState,
    events: Option<UnboundedSender<ConsoleEvent>>,
}

impl Controller {
    pub(crate) fn new(api: IngestionApi) -> Self {
        Self {
            api,
            state: SessionState::default(),
            events: None,
        }
    }

    /// Publish a snapshot to `events` after every committed step.
    pub(crate) fn with_events(mut self, events: UnboundedSender<ConsoleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn into_state(self) -> SessionState {
        self.state
    }

    pub(crate) fn events(&self) -> Option<UnboundedSender<ConsoleEvent>> {
        self.events.clone()
    }

    fn publish(&self) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ConsoleEvent::State(Box::new(self.state.clone())));
        }
    }

    fn begin(&mut self, kind: ActionKind) {
        tracing::info!(action = %kind, "action started");
        self.state.begin_action();
        self.publish();
    }

    fn finish(&mut self, kind: ActionKind, result: Result<Option<String>, ApiError>) -> ActionOutcome {
        let outcome = match result {
            Ok(message) => {
                if let Some(message) = message {
                    self.state.set_message(message);
                }
                tracing::info!(action = %kind, "action completed");
                ActionOutcome::Completed
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(action = %kind, error = %message, "action failed");
                self.state.set_message(message.clone());
                ActionOutcome::Failed(message)
            }
        };
        self.state.finish_action();
        self.publish();
        outcome
    }

    /// Change the selected source. Ignored while an action is in flight.
    pub(crate) fn select_source(&mut self, id: SourceId) -> bool {
        if self.state.busy {
            tracing::warn!(source_id = id, "selection change ignored while busy");
            return false;
        }
        self.state.select_source(id);
        self.publish();
        true
    }

    /// Re-list sources, then reload the held job (if any).
    pub(crate) async fn refresh(&mut self) -> ActionOutcome {
        self.begin(ActionKind::Refresh);
        let result = self.run_refresh().await;
        self.finish(ActionKind::Refresh, result)
    }

    async fn run_refresh(&mut self) -> Result<Option<String>, ApiError> {
        refresh::list_sources(&self.api, &mut self.state).await?;
        self.publish();
        if let Some(ticket) = self.state.detail_ticket() {
            self.load_detail(ticket).await?;
        }
        Ok(None)
    }

    pub(crate) async fn create_source(&mut self, name: &str, csv_path: &str) -> ActionOutcome {
        self.begin(ActionKind::CreateSource);
        let body = NewSource {
            name: name.to_string(),
            csv_path: csv_path.to_string(),
        };
        let result = self.run_create_source(&body).await;
        self.finish(ActionKind::CreateSource, result)
    }

    async fn run_create_source(&mut self, body: &NewSource) -> Result<Option<String>, ApiError> {
        let created = self.api.create_source(body).await?;
        refresh::list_sources(&self.api, &mut self.state).await?;
        self.state.select_source(created.id);
        Ok(Some(format!("Created source #{}", created.id)))
    }

    /// Start a job for the selected source. Does nothing without a resolvable selection.
    pub(crate) async fn start_ingestion(&mut self) -> ActionOutcome {
        let Some(source_id) = self.state.selected_source().map(|s| s.id) else {
            return ActionOutcome::Skipped;
        };
        self.begin(ActionKind::StartIngestion);
        let result = self.run_start_ingestion(source_id).await;
        self.finish(ActionKind::StartIngestion, result)
    }

    async fn run_start_ingestion(&mut self, source_id: SourceId) -> Result<Option<String>, ApiError> {
        let job = self.api.start_ingestion(source_id).await?;
        let message = format!("Started job #{}", job.id);
        self.state.commit_started_job(job);
        self.state.set_message(message.clone());
        self.publish();

        if let Some(ticket) = self.state.detail_ticket() {
            self.load_detail(ticket).await?;
        }
        Ok(Some(message))
    }

    /// Point the console at an existing job and load its detail.
    pub(crate) async fn watch_job(&mut self, job_id: JobId) -> ActionOutcome {
        self.begin(ActionKind::WatchJob);
        let ticket = self.state.watch_job(job_id);
        let result = self
            .load_detail(ticket)
            .await
            .map(|()| Some(format!("Watching job #{job_id}")));
        self.finish(ActionKind::WatchJob, result)
    }

    async fn load_detail(&mut self, ticket: DetailTicket) -> Result<(), ApiError> {
        let detail = refresh::load_job_detail(&self.api, ticket.job_id()).await?;
        if self.state.commit_job_detail(ticket, detail) {
            self.publish();
        }
        Ok(())
    }
}
