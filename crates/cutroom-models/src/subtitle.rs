//! Subtitle segments and styling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One timed subtitle line.
///
/// Optional fields override the global [`SubtitleStyle`] for this segment
/// only. An override always replaces the whole field; defaults and overrides
/// are never blended within a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (must be greater than `start`)
    pub end: f64,
    /// Subtitle text (non-empty after trimming)
    pub text: String,

    /// Vertical position as a percentage of frame height (0 = top)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Font color as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    /// Background color as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationKind>,
}

impl SubtitleSegment {
    /// Create a plain segment with no style overrides.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            position: None,
            font_family: None,
            font_size: None,
            font_color: None,
            background_color: None,
            bold: None,
            animation: None,
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// A segment is renderable when its window is valid and it has text.
    pub fn is_renderable(&self) -> bool {
        self.end > self.start && !self.text.trim().is_empty()
    }
}

/// Named vertical anchor for subtitles, or an explicit position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubtitlePosition {
    Top,
    Center,
    #[default]
    Bottom,
    /// Explicit anchor, both axes as percentages of the frame (0-100).
    Custom { x: f64, y: f64 },
}

/// Entrance animation for a subtitle or text overlay.
///
/// `Typewriter` is carried in the model for the live preview path; the ASS
/// track format cannot express per-character reveal, so the track compiler
/// emits no directive for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnimationKind {
    #[default]
    None,
    Fade,
    SlideUp,
    Typewriter,
}

impl AnimationKind {
    /// Whether this animation renders as a fade directive in the track file.
    pub fn is_fade_style(&self) -> bool {
        matches!(self, AnimationKind::Fade | AnimationKind::SlideUp)
    }
}

/// Global subtitle style defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleStyle {
    pub font_family: String,
    pub font_size: u32,
    /// Font color as `#RRGGBB`
    pub font_color: String,
    /// Background box color as `#RRGGBB`
    pub background_color: String,
    /// Background opacity, 0.0 = invisible .. 1.0 = fully opaque
    pub background_opacity: f64,
    pub position: SubtitlePosition,
    pub bold: bool,
    pub animation: AnimationKind,
    /// Outline width in pixels
    pub outline_width: f64,
    /// Outline color as `#RRGGBB`
    pub outline_color: String,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 32,
            font_color: "#FFFFFF".to_string(),
            background_color: "#000000".to_string(),
            background_opacity: 0.5,
            position: SubtitlePosition::Bottom,
            bold: false,
            animation: AnimationKind::None,
            outline_width: 2.0,
            outline_color: "#000000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_renderable() {
        assert!(SubtitleSegment::new(1.0, 3.5, "hello").is_renderable());
        assert!(!SubtitleSegment::new(3.5, 1.0, "hello").is_renderable());
        assert!(!SubtitleSegment::new(1.0, 3.5, "   ").is_renderable());
    }

    #[test]
    fn test_segment_overrides_roundtrip() {
        let mut seg = SubtitleSegment::new(0.0, 2.0, "hi");
        seg.font_color = Some("#FF0000".to_string());
        seg.animation = Some(AnimationKind::Fade);

        let json = serde_json::to_string(&seg).unwrap();
        let back: SubtitleSegment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seg);
        // Unset overrides are omitted from the wire shape entirely.
        assert!(!json.contains("fontFamily"));
    }

    #[test]
    fn test_position_tagged_serde() {
        let custom = SubtitlePosition::Custom { x: 10.0, y: 80.0 };
        let json = serde_json::to_string(&custom).unwrap();
        assert!(json.contains("\"kind\":\"custom\""));

        let named: SubtitlePosition = serde_json::from_str(r#"{"kind":"top"}"#).unwrap();
        assert_eq!(named, SubtitlePosition::Top);
    }

    #[test]
    fn test_fade_style_animations() {
        assert!(AnimationKind::Fade.is_fade_style());
        assert!(AnimationKind::SlideUp.is_fade_style());
        assert!(!AnimationKind::Typewriter.is_fade_style());
        assert!(!AnimationKind::None.is_fade_style());
    }
}
