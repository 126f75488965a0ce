use crate::api::IngestionApi;
use crate::model::{JobId, SourceId};
use crate::orchestrator::{dispatch, ActionOutcome, Controller, UiCommand};
use crate::session::SessionState;
use crate::transport::{ReqwestHttpClient, Transport};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const NO_SOURCE_TO_START: &str = "No source selected; ingestion not started";

#[derive(Debug, Parser, Clone)]
#[command(
    name = "ingest-console",
    version,
    about = "Monitoring console for the ingestion control plane"
)]
pub struct Cli {
    /// Base URL of the ingestion control-plane API
    #[arg(long, env = "INGEST_API_BASE", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Print the session state as JSON and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Source to select at startup
    #[arg(long)]
    pub source: Option<SourceId>,

    /// Existing job to watch at startup
    #[arg(long)]
    pub job: Option<JobId>,

    /// Name used by the create-source form
    #[arg(long, default_value = "Sample CSV")]
    pub name: String,

    /// CSV path used by the create-source form
    #[arg(long, default_value = "./data/sample.csv")]
    pub csv_path: String,

    /// Create a source from --name/--csv-path at startup
    #[arg(long)]
    pub create: bool,

    /// Start an ingestion for the selected source at startup
    #[arg(long)]
    pub start: bool,

    /// Use --refresh-on-launch true or --refresh-on-launch false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub refresh_on_launch: bool,

    /// Write the final session state as JSON (one-shot modes)
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Log file for TUI mode (defaults to the user data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn is_one_shot(&self) -> bool {
        self.json || self.text
    }
}

/// Runtime configuration gathered from CLI arguments and environment.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub user_agent: String,
    pub initial_source: Option<SourceId>,
    pub initial_job: Option<JobId>,
    pub refresh_on_launch: bool,
    pub create_on_launch: bool,
    pub start_on_launch: bool,
    pub form_name: String,
    pub form_csv_path: String,
}

pub fn build_config(args: &Cli) -> ConsoleConfig {
    ConsoleConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("ingest-console/{}", env!("CARGO_PKG_VERSION")),
        initial_source: args.source,
        initial_job: args.job,
        refresh_on_launch: args.refresh_on_launch,
        create_on_launch: args.create,
        start_on_launch: args.start,
        form_name: args.name.clone(),
        form_csv_path: args.csv_path.clone(),
    }
}

impl ConsoleConfig {
    /// Commands replayed before any operator input, in order.
    pub(crate) fn initial_commands(&self) -> Vec<UiCommand> {
        let mut cmds = Vec::new();
        // Selecting first keeps the list refresh from picking the first source instead.
        if let Some(id) = self.initial_source {
            cmds.push(UiCommand::SelectSource(id));
        }
        if self.refresh_on_launch {
            cmds.push(UiCommand::Refresh);
        }
        if let Some(job_id) = self.initial_job {
            cmds.push(UiCommand::WatchJob(job_id));
        }
        if self.create_on_launch {
            cmds.push(UiCommand::CreateSource {
                name: self.form_name.clone(),
                csv_path: self.form_csv_path.clone(),
            });
        }
        if self.start_on_launch {
            cmds.push(UiCommand::StartIngestion);
        }
        cmds
    }
}

pub(crate) fn build_controller(cfg: &ConsoleConfig) -> Result<Controller> {
    let client = ReqwestHttpClient::new(&cfg.user_agent).context("create HTTP client")?;
    let transport = Transport::new(&cfg.base_url, Arc::new(client));
    Ok(Controller::new(IngestionApi::new(transport)))
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.is_one_shot() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(Cli { text: true, ..args }).await;
        }
    }
    run_once(args).await
}

/// Run the startup commands once, print the result and exit.
async fn run_once(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let mut controller = build_controller(&cfg)?;

    let mut failures = Vec::new();
    for cmd in cfg.initial_commands() {
        let outcome = dispatch(&mut controller, cmd.clone()).await;
        if let Some(message) = startup_failure(&cmd, outcome) {
            failures.push(message);
        }
    }
    let state = controller.into_state();

    if let Some(path) = args.export_json.as_deref() {
        crate::export::export_json(path, &state)?;
        tracing::info!(path = %path.display(), "exported session state");
    }
    print_state(&args, &cfg, &state)?;

    match failures.last() {
        Some(last) => Err(anyhow::anyhow!("{last}")),
        None => Ok(()),
    }
}

/// Failure text for a startup command, if it should fail the run.
///
/// `--start` is an explicit request, so skipping it for lack of a source counts as a failure.
fn startup_failure(cmd: &UiCommand, outcome: ActionOutcome) -> Option<String> {
    match (cmd, outcome) {
        (_, ActionOutcome::Failed(message)) => Some(message),
        (UiCommand::StartIngestion, ActionOutcome::Skipped) => {
            tracing::warn!("start requested but no source is selected");
            Some(NO_SOURCE_TO_START.to_string())
        }
        _ => None,
    }
}

fn print_state(args: &Cli, cfg: &ConsoleConfig, state: &SessionState) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let body = serde_json::to_string_pretty(state).context("serialize session state")?;
        writeln!(out, "{body}")?;
    } else {
        let summary = crate::text_summary::build_text_summary(&cfg.base_url, state);
        for line in summary.lines {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedHttpClient;
    use crate::transport::HttpMethod;
    use clap::CommandFactory;

    #[test]
    fn base_url_defaults_to_loopback_api() {
        let cmd = Cli::command();
        let base_url = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "base_url")
            .expect("base_url argument exists");

        assert_eq!(base_url.get_default_values(), &["http://127.0.0.1:8000"]);
        assert_eq!(
            base_url.get_env(),
            Some(std::ffi::OsStr::new("INGEST_API_BASE"))
        );
    }

    #[test]
    fn defaults_fill_form_and_refresh_on_launch() {
        // Explicit base URL so an INGEST_API_BASE in the environment cannot interfere.
        let args = Cli::parse_from(["ingest-console", "--base-url", DEFAULT_BASE_URL]);
        let cfg = build_config(&args);

        assert!(cfg.refresh_on_launch);
        assert_eq!(cfg.form_name, "Sample CSV");
        assert_eq!(cfg.form_csv_path, "./data/sample.csv");
        assert_eq!(cfg.initial_commands(), vec![UiCommand::Refresh]);
    }

    #[test]
    fn startup_commands_follow_selection_refresh_watch_create_start() {
        let args = Cli::parse_from([
            "ingest-console",
            "--base-url",
            "http://ingest.internal:9000",
            "--source",
            "7",
            "--job",
            "42",
            "--create",
            "--start",
            "--name",
            "Orders",
            "--csv-path",
            "/data/orders.csv",
        ]);
        let cfg = build_config(&args);

        assert_eq!(
            cfg.initial_commands(),
            vec![
                UiCommand::SelectSource(7),
                UiCommand::Refresh,
                UiCommand::WatchJob(42),
                UiCommand::CreateSource {
                    name: "Orders".into(),
                    csv_path: "/data/orders.csv".into(),
                },
                UiCommand::StartIngestion,
            ]
        );
    }

    #[test]
    fn refresh_on_launch_can_be_disabled() {
        let args = Cli::parse_from([
            "ingest-console",
            "--base-url",
            DEFAULT_BASE_URL,
            "--refresh-on-launch",
            "false",
        ]);
        assert!(build_config(&args).initial_commands().is_empty());
    }

    #[test]
    fn skipped_start_is_reported_but_other_skips_are_not() {
        assert_eq!(
            startup_failure(&UiCommand::StartIngestion, ActionOutcome::Skipped).as_deref(),
            Some(NO_SOURCE_TO_START)
        );
        assert_eq!(
            startup_failure(&UiCommand::SelectSource(7), ActionOutcome::Skipped),
            None
        );
        assert_eq!(
            startup_failure(&UiCommand::Refresh, ActionOutcome::Failed("boom".into())).as_deref(),
            Some("boom")
        );
        assert_eq!(startup_failure(&UiCommand::Refresh, ActionOutcome::Completed), None);
    }

    #[tokio::test]
    async fn start_with_empty_source_list_is_reported() {
        let client = Arc::new(ScriptedHttpClient::new("http://api.test"));
        client.reply_json(HttpMethod::Get, "/sources", serde_json::json!([]));
        let mut controller =
            Controller::new(IngestionApi::new(Transport::new("http://api.test", client)));

        let mut failures = Vec::new();
        for cmd in [UiCommand::Refresh, UiCommand::StartIngestion] {
            let outcome = dispatch(&mut controller, cmd.clone()).await;
            failures.extend(startup_failure(&cmd, outcome));
        }

        assert_eq!(failures, vec![NO_SOURCE_TO_START.to_string()]);
    }

    #[test]
    fn json_and_text_are_exclusive() {
        let res = Cli::try_parse_from(["ingest-console", "--json", "--text"]);
        assert!(res.is_err());
    }
}
