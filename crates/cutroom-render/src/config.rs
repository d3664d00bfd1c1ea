//! Render manager configuration.

use std::path::PathBuf;
use std::time::Duration;

use cutroom_models::encoding::PREVIEW_HEIGHT;

/// Render manager configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Directory holding uploaded media and overlay/audio files
    pub content_dir: PathBuf,
    /// Directory receiving rendered output files
    pub output_dir: PathBuf,
    /// Directory holding one status file per job id
    pub status_dir: PathBuf,
    /// Concurrency ceiling for full renders
    pub max_concurrent_renders: usize,
    /// Encoder thread cap, keeps per-process memory bounded
    pub encoder_threads: u32,
    /// Preview clip length in seconds
    pub preview_duration: f64,
    /// Preview output height in pixels
    pub preview_height: u32,
    /// Retention window for the housekeeping sweep
    pub retention: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("output"),
            status_dir: PathBuf::from("status"),
            max_concurrent_renders: 2,
            encoder_threads: 2,
            preview_duration: 5.0,
            preview_height: PREVIEW_HEIGHT,
            retention: Duration::from_secs(24 * 3600),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            content_dir: std::env::var("CUTROOM_CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
            output_dir: std::env::var("CUTROOM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            status_dir: std::env::var("CUTROOM_STATUS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.status_dir),
            max_concurrent_renders: std::env::var("CUTROOM_MAX_RENDERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_renders),
            encoder_threads: std::env::var("CUTROOM_ENCODER_THREADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.encoder_threads),
            preview_duration: std::env::var("CUTROOM_PREVIEW_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.preview_duration),
            preview_height: std::env::var("CUTROOM_PREVIEW_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.preview_height),
            retention: Duration::from_secs(
                std::env::var("CUTROOM_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(24 * 3600),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_concurrent_renders, 2);
        assert_eq!(config.preview_duration, 5.0);
        assert_eq!(config.preview_height, 480);
    }
}
