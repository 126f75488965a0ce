use serde::{Deserialize, Serialize};
use std::fmt;

pub type SourceId = i64;
pub type JobId = i64;

/// Declares a forward-compatible string enumeration owned by the ingestion engine.
///
/// Unknown values decode fine and are displayed verbatim; the listed constants are only the
/// values the console knows how to highlight.
macro_rules! open_enum {
    ($(#[$meta:meta])* $name:ident { $($konst:ident => $value:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            $(pub const $konst: &'static str = $value;)*

            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Case-insensitive comparison against a known value.
            pub fn is(&self, known: &str) -> bool {
                self.0.eq_ignore_ascii_case(known)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

open_enum! {
    /// Engine-side lifecycle of a registered source.
    SourceStatus { ACTIVE => "active" }
}

open_enum! {
    /// Engine-side lifecycle of an ingestion job.
    JobStatus {
        QUEUED => "QUEUED",
        RUNNING => "RUNNING",
        SUCCEEDED => "SUCCEEDED",
        FAILED => "FAILED",
    }
}

open_enum! {
    /// Severity reported with an error record.
    Severity { WARNING => "WARNING", ERROR => "ERROR" }
}

impl JobStatus {
    /// Whether the engine has stopped working on the job.
    pub fn is_finished(&self) -> bool {
        self.is(Self::SUCCEEDED) || self.is(Self::FAILED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    // The boundary keeps the path inside the source config and does not echo it back.
    #[serde(default)]
    pub csv_path: Option<String>,
    pub status: SourceStatus,
}

/// Body of a create-source request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSource {
    pub name: String,
    pub csv_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: JobId,
    #[serde(default)]
    pub source_id: Option<SourceId>,
    pub status: JobStatus,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub checkpoint: Option<String>,
}

/// A record emitted by a job run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub ts: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    /// Engine hint only; the console never retries on its own.
    pub retryable: bool,
    #[serde(default)]
    pub ts: Option<String>,
}

/// Job record plus its events and errors, fetched as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetail {
    pub job: IngestionJob,
    pub events: Vec<Event>,
    pub errors: Vec<ErrorRecord>,
}
