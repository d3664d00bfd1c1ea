//! Additional audio tracks mixed into the render.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One extra audio file mixed on top of the source audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    /// File name of the stored audio, resolved against the content directory
    pub file: String,
    /// Offset into the output timeline, in seconds (>= 0)
    #[serde(default)]
    pub start: f64,
    /// Volume multiplier (> 0, 1.0 = unchanged)
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_volume() -> f64 {
    1.0
}
