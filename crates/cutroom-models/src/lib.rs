//! Shared data models for the Cutroom render backend.
//!
//! This crate provides Serde-serializable types for:
//! - Subtitle segments, styles and free-text/image overlays
//! - Edit settings (trim, speed, filters, Ken-Burns)
//! - Additional audio tracks
//! - Encoding configuration
//! - Render job identifiers and persisted status records
//! - Timestamp formatting and subtitle export (SRT/VTT)

pub mod audio;
pub mod edit;
pub mod encoding;
pub mod export;
pub mod job;
pub mod overlay;
pub mod subtitle;
pub mod timestamp;

// Re-export common types
pub use audio::AudioTrack;
pub use edit::{EditSettings, FilterAdjustments, KenBurns, SpeedSection, Transition, Trim};
pub use encoding::EncodingConfig;
pub use export::{to_srt, to_vtt};
pub use job::{JobId, JobState, JobStatus};
pub use overlay::{ImageOverlay, TextOverlay};
pub use subtitle::{AnimationKind, SubtitlePosition, SubtitleSegment, SubtitleStyle};
pub use timestamp::{format_seconds, format_subtitle_time, parse_subtitle_time, round2};
