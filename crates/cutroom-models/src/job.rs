//! Render job identifiers and persisted status records.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unique identifier for a render job.
///
/// Derived from the media base name plus the creation timestamp in unix
/// milliseconds. A process-wide monotonic guard bumps the millisecond part
/// when two jobs are accepted within the same instant, keeping identifiers
/// unique per process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

fn next_unique_millis(now: i64) -> i64 {
    let mut prev = LAST_ID_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_ID_MILLIS.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

impl JobId {
    /// Synthesize a fresh identifier for a media base name.
    pub fn for_media(base_name: &str) -> Self {
        let millis = next_unique_millis(Utc::now().timestamp_millis());
        Self(format!("{}-{}", base_name, millis))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a render job.
///
/// The only transitions are `Rendering -> Done` and `Rendering -> Error`;
/// terminal states are never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Rendering,
    Done,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Rendering => "rendering",
            JobState::Done => "done",
            JobState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted status record for a render job.
///
/// This is the durable wire shape: `{"status": "rendering"|"done"|"error"}`
/// plus output path/filename on success or a message on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    /// Initial record written when a job is accepted.
    pub fn rendering() -> Self {
        Self {
            status: JobState::Rendering,
            path: None,
            filename: None,
            error: None,
        }
    }

    /// Terminal success record.
    pub fn done(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            status: JobState::Done,
            path: Some(path.into()),
            filename: Some(filename.into()),
            error: None,
        }
    }

    /// Terminal failure record.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobState::Error,
            path: None,
            filename: None,
            error: Some(message.into()),
        }
    }
}
