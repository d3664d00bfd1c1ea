//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor) for full renders
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Preview encoding favors speed over quality.
pub const PREVIEW_PRESET: &str = "ultrafast";
pub const PREVIEW_CRF: u8 = 28;
/// Preview output height in pixels (width follows the source aspect).
pub const PREVIEW_HEIGHT: u32 = 480;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "ultrafast")
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,

    /// Audio codec
    pub audio_codec: String,

    /// Audio bitrate
    pub audio_bitrate: String,

    /// Pixel format forced on the output
    pub pix_fmt: String,

    /// Encoder thread cap; `None` lets the encoder decide
    pub threads: Option<u32>,

    /// Streaming-friendly container flags
    pub faststart: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            pix_fmt: "yuv420p".to_string(),
            threads: None,
            faststart: true,
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for the fast low-resolution preview path.
    pub fn for_preview() -> Self {
        Self {
            preset: PREVIEW_PRESET.to_string(),
            crf: PREVIEW_CRF,
            ..Default::default()
        }
    }

    /// Returns a new config with a capped encoder thread count.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_output_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pix_fmt.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ];

        if let Some(threads) = self.threads {
            args.extend_from_slice(&["-threads".to_string(), threads.to_string()]);
        }

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args
    }
}
