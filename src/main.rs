mod api;
mod cli;
mod export;
mod logging;
mod model;
mod orchestrator;
mod session;
mod text_summary;
mod transport;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::Cli::parse();

    #[cfg(feature = "tui")]
    let tui_mode = !args.is_one_shot();
    #[cfg(not(feature = "tui"))]
    let tui_mode = false;

    if tui_mode {
        if let Some(path) = logging::init_file(args.log_file.as_deref()) {
            tracing::debug!(path = %path.display(), "logging to file");
        }
    } else {
        logging::init_stderr();
    }

    cli::run(args).await
}
