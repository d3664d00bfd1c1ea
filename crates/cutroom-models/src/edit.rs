//! Edit settings: trim, transitions, speed, color filters, Ken-Burns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::overlay::{ImageOverlay, TextOverlay};

/// Declarative description of every edit applied to a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EditSettings {
    pub trim: Trim,
    pub transition: Transition,
    /// Timed speed sections. Only the first section is honored by the
    /// compiler; the rest are preserved as data and reported as unsupported.
    pub speed_sections: Vec<SpeedSection>,
    pub filters: FilterAdjustments,
    pub ken_burns: KenBurns,
    /// Whole clips appended after the main video (file names). Preserved as
    /// data; concatenation is handled upstream of the command compiler.
    pub appended_clips: Vec<String>,
    pub image_overlays: Vec<ImageOverlay>,
    pub text_overlays: Vec<TextOverlay>,
}

impl EditSettings {
    /// Global speed factor: the first speed section, or 1.0.
    ///
    /// Non-positive factors are treated as 1.0 rather than producing a
    /// degenerate time scale.
    pub fn speed(&self) -> f64 {
        match self.speed_sections.first() {
            Some(section) if section.speed > 0.0 => section.speed,
            _ => 1.0,
        }
    }

    /// Number of speed sections beyond the first (unsupported input).
    pub fn ignored_speed_sections(&self) -> usize {
        self.speed_sections.len().saturating_sub(1)
    }
}

/// Trim window over the source media.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Trim {
    /// Start offset in seconds (>= 0)
    pub start: f64,
    /// End in seconds; `None` means end of media
    pub end: Option<f64>,
}

impl Trim {
    /// Resolve the trimmed window against a known media duration.
    ///
    /// Returns `(start, duration)` clamped into the media bounds.
    pub fn resolve(&self, media_duration: f64) -> (f64, f64) {
        let start = self.start.clamp(0.0, media_duration);
        let end = self
            .end
            .unwrap_or(media_duration)
            .clamp(start, media_duration);
        (start, end - start)
    }
}

/// Fade transitions at the edges of the trimmed clip.
///
/// `fade_out` is measured back from the end of the *trimmed* duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Transition {
    /// Fade-in duration in seconds (>= 0)
    pub fade_in: f64,
    /// Fade-out duration in seconds (>= 0)
    pub fade_out: f64,
}

/// One timed speed section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeedSection {
    pub start: f64,
    pub end: f64,
    /// Speed multiplier (> 0, 1.0 = unchanged, 2.0 = double speed)
    pub speed: f64,
}

/// Color and blur adjustments.
///
/// Brightness/contrast/saturation use a 0-200 scale with 100 = neutral;
/// sepia and grayscale are 0-100 amounts; hue rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterAdjustments {
    pub brightness: f64,
    pub contrast: f64,
    pub saturate: f64,
    pub sepia: f64,
    pub grayscale: f64,
    /// Hue rotation in degrees (0-360)
    pub hue_rotate: f64,
    /// Blur radius in pixels (>= 0)
    pub blur: f64,
}

impl Default for FilterAdjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturate: 100.0,
            sepia: 0.0,
            grayscale: 0.0,
            hue_rotate: 0.0,
            blur: 0.0,
        }
    }
}

impl FilterAdjustments {
    /// True when every adjustment sits at its neutral value.
    pub fn is_neutral(&self) -> bool {
        self.brightness == 100.0
            && self.contrast == 100.0
            && self.saturate == 100.0
            && self.sepia == 0.0
            && self.grayscale == 0.0
            && self.hue_rotate == 0.0
            && self.blur == 0.0
    }

    /// True when the combined brightness/contrast/saturation stage is needed.
    pub fn has_eq(&self) -> bool {
        self.brightness != 100.0 || self.contrast != 100.0 || self.saturate != 100.0
    }
}

/// Ken-Burns pan/zoom descriptor.
///
/// Zoom and offsets are interpolated linearly over the clip; offsets are
/// percentages of the pannable area (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KenBurns {
    pub enabled: bool,
    pub zoom_start: f64,
    pub zoom_end: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
}

impl Default for KenBurns {
    fn default() -> Self {
        Self {
            enabled: false,
            zoom_start: 1.0,
            zoom_end: 1.0,
            x_start: 0.0,
            x_end: 0.0,
            y_start: 0.0,
            y_end: 0.0,
        }
    }
}
