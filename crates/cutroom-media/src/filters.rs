//! FFmpeg filter graph construction.
//!
//! Edit settings compile into an ordered chain of named stages, each
//! consuming one labeled stream and producing the next. Stage order is
//! fixed: speed, color corrections, Ken-Burns, fades — every stage's visual
//! effect is defined relative to the previous stage's output.

use cutroom_models::{EditSettings, FilterAdjustments, KenBurns};

use crate::command::FilterStage;
use crate::probe::VideoInfo;

/// Sepia tone as a fixed 3x3 color-channel matrix.
const SEPIA: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Rec. 709 luminance weights, applied to every channel for grayscale.
const LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// An ordered chain of single-input filter stages over labeled streams.
///
/// When no stage has been pushed the chain is a passthrough and
/// [`FilterChain::output`] reports the raw input pad; callers must not
/// assume a rewritten stream exists.
#[derive(Debug, Clone)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
    current: String,
    prefix: String,
    counter: usize,
}

impl FilterChain {
    /// Start a chain reading from an input pad such as `0:v`.
    pub fn new(input: impl Into<String>) -> Self {
        Self::with_prefix(input, "v")
    }

    /// Start a chain with a custom label prefix (e.g. `a` for audio).
    pub fn with_prefix(input: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            stages: Vec::new(),
            current: input.into(),
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Append a stage consuming the current stream.
    pub fn push(&mut self, filter: impl Into<String>) -> &str {
        let output = self.next_label();
        self.stages.push(FilterStage::new(
            vec![self.current.clone()],
            filter,
            output.clone(),
        ));
        self.current = output;
        &self.current
    }

    /// Append a stage consuming the current stream plus extra inputs
    /// (e.g. an overlay composite).
    pub fn push_merge(&mut self, extra_inputs: Vec<String>, filter: impl Into<String>) -> &str {
        let output = self.next_label();
        let mut inputs = vec![self.current.clone()];
        inputs.extend(extra_inputs);
        self.stages
            .push(FilterStage::new(inputs, filter, output.clone()));
        self.current = output;
        &self.current
    }

    /// Append a standalone stage that does not advance the chain, returning
    /// its output label (e.g. preprocessing an overlay input).
    pub fn push_source(&mut self, input: impl Into<String>, filter: impl Into<String>) -> String {
        let output = self.next_label();
        self.stages
            .push(FilterStage::new(vec![input.into()], filter, output.clone()));
        output
    }

    fn next_label(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }

    /// The label of the final stream: the last stage's output, or the raw
    /// input pad for an empty chain.
    pub fn output(&self) -> &str {
        &self.current
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<FilterStage> {
        self.stages
    }
}

/// Build the video filter chain for the trimmed clip.
///
/// `clip_duration` is the trimmed duration in seconds; fades and the
/// Ken-Burns interpolation work on the post-speed output timeline.
pub fn build_video_chain(
    settings: &EditSettings,
    info: &VideoInfo,
    clip_duration: f64,
) -> FilterChain {
    let mut chain = FilterChain::new("0:v");

    // 1. Speed
    let speed = settings.speed();
    if speed != 1.0 {
        chain.push(format!("setpts=PTS/{}", format_f(speed)));
    }
    let out_duration = clip_duration / speed;

    // 2. Color corrections, each independently toggleable
    let filters = &settings.filters;
    if filters.has_eq() {
        chain.push(eq_filter(filters));
    }
    if filters.hue_rotate != 0.0 {
        chain.push(format!("hue=h={}", format_f(filters.hue_rotate)));
    }
    if filters.sepia > 0.0 {
        chain.push(sepia_filter(filters.sepia));
    }
    if filters.grayscale > 0.0 {
        chain.push(grayscale_filter(filters.grayscale));
    }
    if filters.blur > 0.0 {
        chain.push(format!("gblur=sigma={}", format_f(filters.blur)));
    }

    // 3. Ken-Burns pan/zoom
    if settings.ken_burns.enabled {
        chain.push(ken_burns_filter(&settings.ken_burns, info, out_duration));
    }

    // 4. Fades
    let transition = &settings.transition;
    if transition.fade_in > 0.0 {
        chain.push(format!("fade=t=in:st=0:d={}", format_f(transition.fade_in)));
    }
    if transition.fade_out > 0.0 {
        let start = (out_duration - transition.fade_out).max(0.0);
        chain.push(format!(
            "fade=t=out:st={}:d={}",
            format_f(start),
            format_f(transition.fade_out)
        ));
    }

    chain
}

/// Combined brightness/contrast/saturation stage.
///
/// The 0-200 scales map onto the eq filter's ranges: brightness to -1..1,
/// contrast and saturation to 0..2.
fn eq_filter(filters: &FilterAdjustments) -> String {
    format!(
        "eq=brightness={:.3}:contrast={:.3}:saturation={:.3}",
        (filters.brightness - 100.0) / 100.0,
        filters.contrast / 100.0,
        filters.saturate / 100.0,
    )
}

/// Sepia via colorchannelmixer, interpolating the identity matrix toward the
/// sepia matrix by `amount` (0-100).
fn sepia_filter(amount: f64) -> String {
    matrix_mix_filter(&SEPIA, amount)
}

/// Grayscale via colorchannelmixer, interpolating toward the luminance
/// blend with the same technique as sepia.
fn grayscale_filter(amount: f64) -> String {
    let target = [LUMA, LUMA, LUMA];
    matrix_mix_filter(&target, amount)
}

fn matrix_mix_filter(target: &[[f64; 3]; 3], amount: f64) -> String {
    let t = (amount / 100.0).clamp(0.0, 1.0);
    let mix = |row: usize, col: usize| -> f64 {
        let identity = if row == col { 1.0 } else { 0.0 };
        identity + (target[row][col] - identity) * t
    };
    format!(
        "colorchannelmixer=rr={:.4}:rg={:.4}:rb={:.4}:gr={:.4}:gg={:.4}:gb={:.4}:br={:.4}:bg={:.4}:bb={:.4}",
        mix(0, 0), mix(0, 1), mix(0, 2),
        mix(1, 0), mix(1, 1), mix(1, 2),
        mix(2, 0), mix(2, 1), mix(2, 2),
    )
}

/// Ken-Burns pan/zoom: zoom and offsets each interpolate linearly over the
/// output frame count, with the frame index as the independent variable.
fn ken_burns_filter(kb: &KenBurns, info: &VideoInfo, out_duration: f64) -> String {
    // Degenerate durations must not divide by zero.
    let frames = ((out_duration * info.fps).round() as i64).max(1);

    let zoom_start = kb.zoom_start.max(1.0);
    let zoom_end = kb.zoom_end.max(1.0);
    let zoom_step = (zoom_end - zoom_start) / frames as f64;

    let x_start = kb.x_start.clamp(0.0, 100.0) / 100.0;
    let x_step = (kb.x_end.clamp(0.0, 100.0) / 100.0 - x_start) / frames as f64;
    let y_start = kb.y_start.clamp(0.0, 100.0) / 100.0;
    let y_step = (kb.y_end.clamp(0.0, 100.0) / 100.0 - y_start) / frames as f64;

    // Output size must stay even for the encoder.
    let width = even(info.width);
    let height = even(info.height);

    format!(
        "zoompan=z='{z0}+{dz}*on':\
         x='(iw-iw/zoom)*({x0}+{dx}*on)':\
         y='(ih-ih/zoom)*({y0}+{dy}*on)':\
         d=1:s={w}x{h}:fps={fps}",
        z0 = format_f(zoom_start),
        dz = format_step(zoom_step),
        x0 = format_f(x_start),
        dx = format_step(x_step),
        y0 = format_f(y_start),
        dy = format_step(y_step),
        w = width,
        h = height,
        fps = format_f(info.fps),
    )
}

/// Round a dimension down to the nearest even value.
pub fn even(value: u32) -> u32 {
    value & !1
}

fn format_f(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.4}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn format_step(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{:.8}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutroom_models::{SpeedSection, Transition};

    fn info() -> VideoInfo {
        VideoInfo {
            width: 1920,
            height: 1080,
            duration: 60.0,
            fps: 30.0,
        }
    }

    #[test]
    fn test_neutral_settings_build_empty_chain() {
        let settings = EditSettings::default();
        let chain = build_video_chain(&settings, &info(), 60.0);
        assert!(chain.is_empty());
        assert_eq!(chain.output(), "0:v");
    }

    #[test]
    fn test_neutral_filter_adjustments_are_passthrough() {
        let settings = EditSettings {
            filters: FilterAdjustments {
                brightness: 100.0,
                contrast: 100.0,
                saturate: 100.0,
                sepia: 0.0,
                grayscale: 0.0,
                hue_rotate: 0.0,
                blur: 0.0,
            },
            ..Default::default()
        };
        let chain = build_video_chain(&settings, &info(), 60.0);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let settings = EditSettings {
            speed_sections: vec![SpeedSection {
                start: 0.0,
                end: 60.0,
                speed: 2.0,
            }],
            filters: FilterAdjustments {
                brightness: 120.0,
                sepia: 50.0,
                blur: 2.0,
                ..Default::default()
            },
            ken_burns: KenBurns {
                enabled: true,
                zoom_start: 1.0,
                zoom_end: 1.3,
                ..Default::default()
            },
            transition: Transition {
                fade_in: 1.0,
                fade_out: 2.0,
            },
            ..Default::default()
        };

        let chain = build_video_chain(&settings, &info(), 60.0);
        let filters: Vec<&str> = chain
            .stages()
            .iter()
            .map(|s| s.filter.split(['=', ':']).next().unwrap())
            .collect();
        assert_eq!(
            filters,
            vec!["setpts", "eq", "colorchannelmixer", "gblur", "zoompan", "fade", "fade"]
        );

        // Labels thread through the chain.
        assert_eq!(chain.stages()[0].inputs, vec!["0:v"]);
        assert_eq!(chain.stages()[0].output, "v1");
        assert_eq!(chain.stages()[1].inputs, vec!["v1"]);
        assert_eq!(chain.output(), "v7");
    }

    #[test]
    fn test_speed_stage_only_when_not_unity() {
        let settings = EditSettings {
            speed_sections: vec![SpeedSection {
                start: 0.0,
                end: 60.0,
                speed: 1.0,
            }],
            ..Default::default()
        };
        let chain = build_video_chain(&settings, &info(), 60.0);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_eq_maps_scales() {
        let filter = eq_filter(&FilterAdjustments {
            brightness: 150.0,
            contrast: 50.0,
            saturate: 200.0,
            ..Default::default()
        });
        assert_eq!(filter, "eq=brightness=0.500:contrast=0.500:saturation=2.000");
    }

    #[test]
    fn test_sepia_full_amount_is_fixed_matrix() {
        let filter = sepia_filter(100.0);
        assert!(filter.starts_with("colorchannelmixer=rr=0.3930:rg=0.7690:rb=0.1890"));
    }

    #[test]
    fn test_sepia_interpolates_with_identity() {
        // At 50% the red-red coefficient sits halfway between 1.0 and 0.393.
        let filter = sepia_filter(50.0);
        assert!(filter.contains("rr=0.6965"));
        assert!(filter.contains("rg=0.3845"));
    }

    #[test]
    fn test_grayscale_uses_luminance_blend() {
        let filter = grayscale_filter(100.0);
        assert!(filter.contains("rr=0.2126"));
        assert!(filter.contains("rg=0.7152"));
        assert!(filter.contains("bb=0.0722"));
    }

    #[test]
    fn test_disabled_ken_burns_has_no_zoompan() {
        let settings = EditSettings {
            ken_burns: KenBurns {
                enabled: false,
                zoom_start: 1.0,
                zoom_end: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let chain = build_video_chain(&settings, &info(), 60.0);
        assert!(!chain.stages().iter().any(|s| s.filter.contains("zoompan")));
    }

    #[test]
    fn test_ken_burns_guards_degenerate_duration() {
        let kb = KenBurns {
            enabled: true,
            zoom_start: 1.0,
            zoom_end: 2.0,
            ..Default::default()
        };
        // Zero duration clamps to one frame; no division by zero.
        let filter = ken_burns_filter(&kb, &info(), 0.0);
        assert!(filter.contains("zoompan=z='1+1*on'"));
        assert!(filter.contains("s=1920x1080"));
    }

    #[test]
    fn test_ken_burns_output_size_is_even() {
        let odd_info = VideoInfo {
            width: 1281,
            height: 721,
            duration: 10.0,
            fps: 30.0,
        };
        let kb = KenBurns {
            enabled: true,
            zoom_start: 1.0,
            zoom_end: 1.2,
            ..Default::default()
        };
        let filter = ken_burns_filter(&kb, &odd_info, 10.0);
        assert!(filter.contains("s=1280x720"));
    }

    #[test]
    fn test_fade_out_starts_at_duration_minus_length() {
        let settings = EditSettings {
            transition: Transition {
                fade_in: 0.0,
                fade_out: 2.0,
            },
            ..Default::default()
        };
        let chain = build_video_chain(&settings, &info(), 30.0);
        assert_eq!(chain.stages().len(), 1);
        assert_eq!(chain.stages()[0].filter, "fade=t=out:st=28:d=2");
    }

    #[test]
    fn test_fade_out_start_accounts_for_speed() {
        let settings = EditSettings {
            speed_sections: vec![SpeedSection {
                start: 0.0,
                end: 30.0,
                speed: 2.0,
            }],
            transition: Transition {
                fade_in: 0.0,
                fade_out: 2.0,
            },
            ..Default::default()
        };
        // 30s clip at 2x plays for 15s; the fade starts at 13s.
        let chain = build_video_chain(&settings, &info(), 30.0);
        let fade = &chain.stages().last().unwrap().filter;
        assert_eq!(fade, "fade=t=out:st=13:d=2");
    }

    #[test]
    fn test_fade_out_start_clamps_at_zero() {
        let settings = EditSettings {
            transition: Transition {
                fade_in: 0.0,
                fade_out: 10.0,
            },
            ..Default::default()
        };
        let chain = build_video_chain(&settings, &info(), 4.0);
        assert_eq!(chain.stages()[0].filter, "fade=t=out:st=0:d=10");
    }
}
