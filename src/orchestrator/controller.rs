//! Command loop between presentation layers and the [`Controller`].
//!
//! Runs one action at a time and publishes session snapshots for the UI to render.

use super::actions::{ActionOutcome, Controller};
use crate::model::{JobId, SourceId};
use crate::session::SessionState;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Refresh,
    CreateSource { name: String, csv_path: String },
    StartIngestion,
    SelectSource(SourceId),
    WatchJob(JobId),
    Quit,
}

impl UiCommand {
    fn label(&self) -> &'static str {
        match self {
            UiCommand::Refresh => "refresh",
            UiCommand::CreateSource { .. } => "create source",
            UiCommand::StartIngestion => "start ingestion",
            UiCommand::SelectSource(_) => "select source",
            UiCommand::WatchJob(_) => "watch job",
            UiCommand::Quit => "quit",
        }
    }
}

/// Events sent from the controller to presentation layers.
#[derive(Debug, Clone)]
pub(crate) enum ConsoleEvent {
    // Boxed: the snapshot is much larger than a notice.
    State(Box<SessionState>),
    /// Transient feedback that is not an action outcome (e.g. a rejected command).
    Notice(String),
}

pub(crate) async fn dispatch(controller: &mut Controller, cmd: UiCommand) -> ActionOutcome {
    match cmd {
        UiCommand::Refresh => controller.refresh().await,
        UiCommand::CreateSource { name, csv_path } => {
            controller.create_source(&name, &csv_path).await
        }
        UiCommand::StartIngestion => controller.start_ingestion().await,
        UiCommand::WatchJob(job_id) => controller.watch_job(job_id).await,
        UiCommand::SelectSource(id) => {
            if controller.select_source(id) {
                ActionOutcome::Completed
            } else {
                ActionOutcome::Skipped
            }
        }
        UiCommand::Quit => ActionOutcome::Skipped,
    }
}

/// Run `cmd` to completion while rejecting anything else that arrives meanwhile.
///
/// Returns `true` if a quit was requested (or the command channel closed) during the action.
async fn drive(
    controller: &mut Controller,
    cmd: UiCommand,
    cmd_rx: &mut UnboundedReceiver<UiCommand>,
) -> bool {
    let running = cmd.label();
    let events = controller.events();
    let action = dispatch(controller, cmd);
    tokio::pin!(action);

    let mut quit_pending = false;
    let mut inbox_open = true;
    loop {
        tokio::select! {
            outcome = &mut action => {
                tracing::debug!(action = running, ?outcome, "command finished");
                break;
            }
            next = cmd_rx.recv(), if inbox_open => match next {
                // No cancellation: quit waits for the in-flight request.
                Some(UiCommand::Quit) => quit_pending = true,
                None => {
                    inbox_open = false;
                    quit_pending = true;
                }
                Some(other) => {
                    tracing::warn!(running, rejected = other.label(), "command rejected while busy");
                    if let Some(tx) = &events {
                        let _ = tx.send(ConsoleEvent::Notice(format!(
                            "Busy with {running}; ignored {}",
                            other.label()
                        )));
                    }
                }
            }
        }
    }
    quit_pending
}

/// Process UI commands until quit. Returns the final session state.
pub(crate) async fn run_controller(
    mut controller: Controller,
    initial: Vec<UiCommand>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> SessionState {
    let mut pending = initial.into_iter();
    loop {
        let cmd = match pending.next() {
            Some(cmd) => cmd,
            None => match cmd_rx.recv().await {
                Some(cmd) => cmd,
                None => break,
            },
        };
        if cmd == UiCommand::Quit {
            break;
        }
        if drive(&mut controller, cmd, &mut cmd_rx).await {
            break;
        }
    }
    controller.into_state()
}

/// Convenience for callers that only need a sender/receiver pair.
pub(crate) fn command_channel() -> (UnboundedSender<UiCommand>, UnboundedReceiver<UiCommand>) {
    tokio::sync::mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::IngestionApi;
    use crate::transport::testing::ScriptedHttpClient;
    use crate::transport::{ApiError, HttpClient, HttpMethod, HttpRequest, HttpResponse, Transport};
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use tokio::sync::{mpsc, Notify};

    fn controller(client: Arc<dyn HttpClient>) -> (Controller, mpsc::UnboundedReceiver<ConsoleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctl = Controller::new(IngestionApi::new(Transport::new("http://api.test", client)))
            .with_events(tx);
        (ctl, rx)
    }

    /// Holds every request until released, so commands can arrive mid-flight.
    struct GatedHttpClient {
        gate: Arc<Notify>,
        entered: Arc<Notify>,
    }

    impl HttpClient for GatedHttpClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + 'a>> {
            let gate = self.gate.clone();
            let entered = self.entered.clone();
            Box::pin(async move {
                entered.notify_one();
                gate.notified().await;
                Ok(HttpResponse::ok_json(
                    json!([{"id": 1, "name": "a", "status": "active"}]).to_string(),
                ))
            })
        }
    }

    #[tokio::test]
    async fn initial_commands_run_before_inbox() {
        let client = Arc::new(ScriptedHttpClient::new("http://api.test"));
        client.reply_json(
            HttpMethod::Get,
            "/sources",
            json!([{"id": 5, "name": "s", "status": "active"}]),
        );
        let (ctl, _events) = controller(client.clone());
        let (cmd_tx, cmd_rx) = command_channel();
        drop(cmd_tx);

        let state = run_controller(ctl, vec![UiCommand::Refresh], cmd_rx).await;

        assert_eq!(state.selected_source_id, Some(5));
        assert_eq!(client.calls(), vec!["GET /sources"]);
    }

    #[tokio::test]
    async fn commands_during_an_action_are_rejected() {
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let client = Arc::new(GatedHttpClient {
            gate: gate.clone(),
            entered: entered.clone(),
        });
        let (ctl, mut events) = controller(client);
        let (cmd_tx, cmd_rx) = command_channel();

        let handle = tokio::spawn(run_controller(ctl, vec![UiCommand::Refresh], cmd_rx));
        entered.notified().await;
        cmd_tx
            .send(UiCommand::SelectSource(9))
            .expect("controller should be listening");
        cmd_tx.send(UiCommand::Quit).expect("controller should be listening");

        // Let the loop observe both commands before the request completes.
        let notice = loop {
            match events.recv().await.expect("controller should publish") {
                ConsoleEvent::Notice(text) => break text,
                ConsoleEvent::State(_) => continue,
            }
        };
        assert_eq!(notice, "Busy with refresh; ignored select source");
        gate.notify_one();

        let state = handle.await.expect("controller task should finish");
        assert_eq!(state.selected_source_id, Some(1));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn select_source_publishes_snapshot() {
        let client = Arc::new(ScriptedHttpClient::new("http://api.test"));
        let (ctl, mut events) = controller(client);
        let (cmd_tx, cmd_rx) = command_channel();
        cmd_tx
            .send(UiCommand::SelectSource(3))
            .expect("receiver alive");
        cmd_tx.send(UiCommand::Quit).expect("receiver alive");

        let state = run_controller(ctl, Vec::new(), cmd_rx).await;

        assert_eq!(state.selected_source_id, Some(3));
        match events.try_recv() {
            Ok(ConsoleEvent::State(snapshot)) => assert_eq!(snapshot.selected_source_id, Some(3)),
            other => panic!("expected a state snapshot, got {other:?}"),
        }
    }
}
