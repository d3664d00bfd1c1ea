//! Error types for the render job manager.

use cutroom_media::MediaError;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the render job manager.
///
/// `Capacity` and `PreviewBusy` are distinct try-again-later signals so
/// callers can back off instead of treating them as hard failures. Errors
/// raised after a job was accepted are recorded into the job status, never
/// returned to the accepting call.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render capacity reached ({limit} concurrent renders)")]
    Capacity { limit: usize },

    #[error("A preview is already rendering")]
    PreviewBusy,

    #[error("Unknown job: {0}")]
    NotFound(String),

    #[error("Failed to launch encoder: {0}")]
    Launch(String),

    #[error("Encode failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    /// Encode failure naming the process exit code.
    pub fn encode_exit(exit_code: Option<i32>, detail: Option<String>) -> Self {
        let mut message = match exit_code {
            Some(code) => format!("encoder exited with code {}", code),
            None => "encoder terminated by signal".to_string(),
        };
        if let Some(detail) = detail {
            message.push_str(": ");
            message.push_str(&detail);
        }
        Self::Encode(message)
    }
}
