//! Subtitle/overlay track compiler.
//!
//! Turns subtitle segments, a global style and free-text overlays into one
//! ASS document that the encode command burns in via the `ass` filter.
//! Dialogue and overlays each get a style definition; events carry inline
//! override tags only for the fields that differ from their style defaults.

use std::path::Path;

use cutroom_models::{SubtitlePosition, SubtitleSegment, SubtitleStyle, TextOverlay};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Style name used for subtitle segments.
pub const DIALOGUE_STYLE: &str = "Default";
/// Style name used for free-text overlays.
pub const OVERLAY_STYLE: &str = "Overlay";

/// Fade directive duration applied for fade-style animations.
const FADE_MS: u32 = 200;

/// Overlay style defaults; per-overlay values emit override tags when they
/// differ from these.
const OVERLAY_FONT_SIZE: u32 = 48;
const OVERLAY_COLOR: &str = "#FFFFFF";

/// Compile the full track document.
///
/// Emits exactly one event per subtitle segment (in input order) and one
/// per text overlay. Inputs are validated upstream; unparseable hex colors
/// fall back to white (text) or black (background) rather than failing.
pub fn compile_track(
    segments: &[SubtitleSegment],
    style: &SubtitleStyle,
    overlays: &[TextOverlay],
    frame_width: u32,
    frame_height: u32,
) -> String {
    let mut doc = String::new();

    doc.push_str("[Script Info]\n");
    doc.push_str("ScriptType: v4.00+\n");
    doc.push_str(&format!("PlayResX: {}\n", frame_width));
    doc.push_str(&format!("PlayResY: {}\n", frame_height));
    doc.push_str("WrapStyle: 2\n");
    doc.push_str("ScaledBorderAndShadow: yes\n\n");

    doc.push_str("[V4+ Styles]\n");
    doc.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    doc.push_str(&dialogue_style_line(style, frame_width, frame_height));
    doc.push_str(&overlay_style_line(style));
    doc.push('\n');

    doc.push_str("[Events]\n");
    doc.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    for segment in segments {
        doc.push_str(&segment_event(segment, style, frame_width, frame_height));
    }
    for overlay in overlays {
        doc.push_str(&overlay_event(overlay, frame_width, frame_height));
    }

    debug!(
        segments = segments.len(),
        overlays = overlays.len(),
        "Compiled track document"
    );
    doc
}

/// Write a compiled track document to disk.
pub fn write_track(path: &Path, document: &str) -> MediaResult<()> {
    std::fs::write(path, document).map_err(|source| MediaError::TrackWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn dialogue_style_line(style: &SubtitleStyle, frame_width: u32, frame_height: u32) -> String {
    let font_size = effective_font_size(style.font_size, frame_width, frame_height);
    let primary = hex_to_track_color(&style.font_color);

    // BorderStyle 3 draws the background box using the outline/back colours;
    // without a box the configured outline is used instead.
    let boxed = style.background_opacity > 0.0;
    let (border_style, outline_color, outline_width) = if boxed {
        let alpha = background_alpha(style.background_opacity);
        (
            3,
            hex_to_track_color_with_alpha(&style.background_color, alpha),
            style.outline_width.max(1.0),
        )
    } else {
        (1, hex_to_track_color(&style.outline_color), style.outline_width)
    };
    let back = if boxed {
        hex_to_track_color_with_alpha(&style.background_color, background_alpha(style.background_opacity))
    } else {
        hex_to_track_color(&style.outline_color)
    };

    let margin_h = (frame_width as f64 * 0.02).round() as u32;
    let margin_v = (frame_height as f64 * 0.05).round() as u32;

    format!(
        "Style: {},{},{},{},{},{},{},{},0,0,0,100,100,0,0,{},{},0,{},{},{},{},1\n",
        DIALOGUE_STYLE,
        style.font_family,
        font_size,
        primary,
        primary,
        outline_color,
        back,
        ass_bool(style.bold),
        border_style,
        format_scalar(outline_width),
        alignment(&style.position),
        margin_h,
        margin_h,
        margin_v,
    )
}

fn overlay_style_line(style: &SubtitleStyle) -> String {
    let primary = hex_to_track_color(OVERLAY_COLOR);
    let outline = hex_to_track_color("#000000");
    format!(
        "Style: {},{},{},{},{},{},{},0,0,0,0,100,100,0,0,1,2,0,5,0,0,0,1\n",
        OVERLAY_STYLE, style.font_family, OVERLAY_FONT_SIZE, primary, primary, outline, outline,
    )
}

fn segment_event(
    segment: &SubtitleSegment,
    style: &SubtitleStyle,
    frame_width: u32,
    frame_height: u32,
) -> String {
    let mut tags = String::new();

    if let Some(ref family) = segment.font_family {
        if family != &style.font_family {
            tags.push_str(&format!("\\fn{}", family));
        }
    }
    if let Some(size) = segment.font_size {
        if size != style.font_size {
            tags.push_str(&format!(
                "\\fs{}",
                effective_font_size(size, frame_width, frame_height)
            ));
        }
    }
    if let Some(ref color) = segment.font_color {
        if color != &style.font_color {
            tags.push_str(&format!("\\1c{}&", bgr_hex(color)));
        }
    }
    if let Some(ref background) = segment.background_color {
        if background != &style.background_color {
            tags.push_str(&format!("\\3c{0}&\\4c{0}&", bgr_hex(background)));
        }
    }
    if let Some(bold) = segment.bold {
        if bold != style.bold {
            tags.push_str(if bold { "\\b1" } else { "\\b0" });
        }
    }

    // Explicit positions: a per-segment vertical percentage wins over a
    // custom-positioned style.
    if let Some(position) = segment.position {
        let y = (frame_height as f64 * clamp_pct(position) / 100.0).round() as u32;
        tags.push_str(&format!("\\pos({},{})", frame_width / 2, y));
    } else if let SubtitlePosition::Custom { x, y } = style.position {
        let x = (frame_width as f64 * clamp_pct(x) / 100.0).round() as u32;
        let y = (frame_height as f64 * clamp_pct(y) / 100.0).round() as u32;
        tags.push_str(&format!("\\pos({},{})", x, y));
    }

    let animation = segment.animation.unwrap_or(style.animation);
    if animation.is_fade_style() {
        tags.push_str(&format!("\\fad({},{})", FADE_MS, FADE_MS));
    }

    event_line(0, DIALOGUE_STYLE, segment.start, segment.end, &tags, &segment.text)
}

fn overlay_event(overlay: &TextOverlay, frame_width: u32, frame_height: u32) -> String {
    let mut tags = String::new();

    let x = (frame_width as f64 * clamp_pct(overlay.x) / 100.0).round() as u32;
    let y = (frame_height as f64 * clamp_pct(overlay.y) / 100.0).round() as u32;
    tags.push_str(&format!("\\pos({},{})", x, y));

    if overlay.font_size != OVERLAY_FONT_SIZE {
        tags.push_str(&format!(
            "\\fs{}",
            effective_font_size(overlay.font_size, frame_width, frame_height)
        ));
    }
    if overlay.color != OVERLAY_COLOR {
        tags.push_str(&format!("\\1c{}&", bgr_hex(&overlay.color)));
    }
    if overlay.opacity < 1.0 {
        tags.push_str(&format!("\\alpha&H{:02X}&", background_alpha(overlay.opacity)));
    }
    if overlay.animation.is_fade_style() {
        tags.push_str(&format!("\\fad({},{})", FADE_MS, FADE_MS));
    }

    // Layer 1 keeps free text above the subtitle layer.
    event_line(1, OVERLAY_STYLE, overlay.start, overlay.end, &tags, &overlay.text)
}

fn event_line(layer: u8, style: &str, start: f64, end: f64, tags: &str, text: &str) -> String {
    let tags = if tags.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", tags)
    };
    format!(
        "Dialogue: {},{},{},{},,0,0,0,,{}{}\n",
        layer,
        ass_timestamp(start),
        ass_timestamp(end),
        style,
        tags,
        escape_text(text),
    )
}

/// Convert `#RRGGBB` to the track format's `&H00BBGGRR` (alpha-first,
/// blue/green/red order). Pure: same input, same output, no hidden state.
pub fn hex_to_track_color(hex: &str) -> String {
    hex_to_track_color_with_alpha(hex, 0x00)
}

/// Same conversion with an explicit alpha byte (0 = opaque).
pub fn hex_to_track_color_with_alpha(hex: &str, alpha: u8) -> String {
    let (r, g, b) = parse_hex_rgb(hex).unwrap_or((255, 255, 255));
    format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, b, g, r)
}

/// Inline color tags take `&HBBGGRR` without the alpha byte.
fn bgr_hex(hex: &str) -> String {
    let (r, g, b) = parse_hex_rgb(hex).unwrap_or((255, 255, 255));
    format!("&H{:02X}{:02X}{:02X}", b, g, r)
}

/// Opacity (1.0 = fully opaque) to the track's inverted alpha byte
/// (0 = opaque, 255 = transparent).
pub fn background_alpha(opacity: f64) -> u8 {
    ((1.0 - opacity.clamp(0.0, 1.0)) * 255.0).round() as u8
}

fn parse_hex_rgb(value: &str) -> Option<(u8, u8, u8)> {
    let normalized = value.trim().trim_start_matches('#');
    if normalized.len() != 6 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&normalized[0..2], 16).ok()?;
    let g = u8::from_str_radix(&normalized[2..4], 16).ok()?;
    let b = u8::from_str_radix(&normalized[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Format seconds as the track timestamp `H:MM:SS.cc` (centiseconds).
pub fn ass_timestamp(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
}

/// Named positions map to fixed numpad anchors; custom anchors keep the
/// bottom alignment and position each event explicitly.
fn alignment(position: &SubtitlePosition) -> u8 {
    match position {
        SubtitlePosition::Top => 8,
        SubtitlePosition::Center => 5,
        SubtitlePosition::Bottom => 2,
        SubtitlePosition::Custom { .. } => 2,
    }
}

/// Cap the font size on portrait frames so wrapped lines stay inside the
/// narrow dimension.
fn effective_font_size(size: u32, frame_width: u32, frame_height: u32) -> u32 {
    if frame_height > frame_width {
        size.min(frame_width / 10)
    } else {
        size
    }
}

fn clamp_pct(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn format_scalar(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn ass_bool(value: bool) -> i8 {
    if value {
        -1
    } else {
        0
    }
}

fn escape_text(text: &str) -> String {
    text.trim()
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}
