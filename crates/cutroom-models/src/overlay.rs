//! Time-windowed text and image overlays.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::subtitle::AnimationKind;

/// Free text drawn over the video for a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (must be greater than `start`)
    pub end: f64,
    /// Horizontal anchor as a percentage of frame width (0-100)
    #[serde(default = "default_center")]
    pub x: f64,
    /// Vertical anchor as a percentage of frame height (0-100)
    #[serde(default = "default_center")]
    pub y: f64,
    #[serde(default = "default_overlay_font_size")]
    pub font_size: u32,
    /// Text color as `#RRGGBB`
    #[serde(default = "default_overlay_color")]
    pub color: String,
    /// 0.0 = invisible .. 1.0 = fully opaque
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub animation: AnimationKind,
}

/// A stored image composited over the video for a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlay {
    /// File name of the stored image, resolved against the content directory
    pub file: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (must be greater than `start`)
    pub end: f64,
    /// Horizontal anchor as a percentage of frame width (0-100)
    #[serde(default)]
    pub x: f64,
    /// Vertical anchor as a percentage of frame height (0-100)
    #[serde(default)]
    pub y: f64,
    /// Rendered width as a percentage of frame width (0-100)
    #[serde(default = "default_image_width")]
    pub width: f64,
    /// 0.0 = invisible .. 1.0 = fully opaque
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_center() -> f64 {
    50.0
}

fn default_overlay_font_size() -> u32 {
    48
}

fn default_overlay_color() -> String {
    "#FFFFFF".to_string()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_image_width() -> f64 {
    25.0
}
