//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing media or compiling a render.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Probe failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Failed to write track file {path}: {source}")]
    TrackWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }
}
