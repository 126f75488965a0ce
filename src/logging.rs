//! Tracing setup.
//!
//! The TUI owns the terminal, so in that mode logs go to a file instead of stderr.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "INGEST_CONSOLE_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Default log location: `<data_local_dir>/ingest-console/console.log`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ingest-console").join("console.log"))
}

/// Log to stderr (one-shot modes).
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_sink() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::sink)
        .try_init();
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Log to `path` (or the default location). Logs are discarded when no path resolves or the
/// file cannot be opened; the TUI still starts. Returns the path actually logged to.
pub fn init_file(path: Option<&Path>) -> Option<PathBuf> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_log_path) else {
        init_sink();
        return None;
    };
    let file = match open_log_file(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("logging disabled: {e:#}");
            init_sink();
            return None;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Some(path)
}
