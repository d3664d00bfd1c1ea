//! FFprobe video information.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Defaults used when the probe output omits individual stream fields.
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_FPS: f64 = 30.0;

/// Video file information, derived once per render and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
    /// Frame rate (fps)
    pub fps: f64,
}

impl VideoInfo {
    /// Portrait detection: height strictly greater than width.
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a video file for information.
///
/// Width, height and frame rate fall back to 1920/1080/30 when the tool
/// omits them; a missing or unparseable duration is an error because every
/// downstream time computation depends on it.
pub async fn probe(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::probe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    parse_probe_output(probe)
}

fn parse_probe_output(probe: FfprobeOutput) -> MediaResult<VideoInfo> {
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::probe_failed("No duration in probe output", None))?;

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

    let fps = video_stream
        .and_then(|s| s.avg_frame_rate.as_deref().or(s.r_frame_rate.as_deref()))
        .and_then(parse_frame_rate)
        .unwrap_or(DEFAULT_FPS);

    Ok(VideoInfo {
        width: video_stream.and_then(|s| s.width).unwrap_or(DEFAULT_WIDTH),
        height: video_stream.and_then(|s| s.height).unwrap_or(DEFAULT_HEIGHT),
        duration,
        fps,
    })
}

/// Parse a frame rate string (e.g., "30/1", "30000/1001" or "29.97").
///
/// The rational form is split into numerator and denominator and divided
/// explicitly; the string is never handed to an expression evaluator.
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den > 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok().filter(|&fps| fps > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_json(json: &str) -> MediaResult<VideoInfo> {
        parse_probe_output(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("30/0").is_none());
        assert!(parse_frame_rate("garbage").is_none());
    }

    #[test]
    fn test_full_probe_output() {
        let info = probe_json(
            r#"{
                "format": {"duration": "12.500"},
                "streams": [
                    {"codec_type": "audio"},
                    {"codec_type": "video", "width": 1280, "height": 720,
                     "avg_frame_rate": "30000/1001"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert!((info.duration - 12.5).abs() < 0.001);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert!(!info.is_portrait());
    }

    #[test]
    fn test_missing_stream_fields_use_defaults() {
        let info = probe_json(
            r#"{
                "format": {"duration": "3.0"},
                "streams": [{"codec_type": "video"}]
            }"#,
        )
        .unwrap();
        assert_eq!(info.width, DEFAULT_WIDTH);
        assert_eq!(info.height, DEFAULT_HEIGHT);
        assert_eq!(info.fps, DEFAULT_FPS);
    }

    #[test]
    fn test_missing_duration_is_an_error() {
        let result = probe_json(r#"{"format": {}, "streams": []}"#);
        assert!(matches!(result, Err(MediaError::ProbeFailed { .. })));
    }
}
