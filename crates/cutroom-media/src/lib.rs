#![deny(unreachable_patterns)]
//! FFmpeg surface for the Cutroom render pipeline.
//!
//! This crate provides:
//! - Media probing via ffprobe (`probe`)
//! - The subtitle/overlay track compiler (`track`)
//! - The video filter graph builder (`filters`)
//! - A structured FFmpeg command builder (`command`)
//! - The render compiler tying all of the above together (`compile`)
//! - Progress parsing for `-progress pipe:2` (`progress`)
//!
//! Nothing in this crate spawns an encoder; execution belongs to the render
//! job manager.

pub mod command;
pub mod compile;
pub mod error;
pub mod filters;
pub mod probe;
pub mod progress;
pub mod track;

// Re-export common types
pub use command::{escape_filter_path, FfmpegCommand, FilterStage, InputSpec};
pub use compile::{compile_render, compile_render_with_info, CompiledRender, RenderOptions};
pub use error::{MediaError, MediaResult};
pub use filters::{build_video_chain, FilterChain};
pub use probe::{probe, VideoInfo};
pub use progress::{looks_like_error, parse_progress_line, RenderProgress};
pub use track::{compile_track, hex_to_track_color, write_track};

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<std::path::PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<std::path::PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
