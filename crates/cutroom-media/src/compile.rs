//! Render compiler: edit settings to a single FFmpeg invocation.
//!
//! Compilation only builds text and writes the track artifact; it never
//! executes anything. The returned command is handed to the render job
//! manager, which owns process execution and cleanup.

use std::path::PathBuf;

use cutroom_models::{
    format_seconds, AudioTrack, EditSettings, EncodingConfig, SubtitleSegment, SubtitleStyle,
};
use tracing::{debug, warn};

use crate::command::{escape_filter_path, FfmpegCommand};
use crate::error::MediaResult;
use crate::filters::{build_video_chain, even};
use crate::probe::{probe, VideoInfo};
use crate::track::{compile_track, write_track};

/// Everything needed to compile one render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Main video input
    pub input: PathBuf,
    /// Rendered output file
    pub output: PathBuf,
    /// Directory holding referenced overlay images and audio files
    pub media_dir: PathBuf,
    pub settings: EditSettings,
    pub subtitles: Vec<SubtitleSegment>,
    pub style: SubtitleStyle,
    pub audio_tracks: Vec<AudioTrack>,
    pub encoding: EncodingConfig,
    /// Downscale target for the preview path (`None` keeps the source size)
    pub target_height: Option<u32>,
}

impl RenderOptions {
    /// Options with default settings for a plain re-encode.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            media_dir: media_dir.into(),
            settings: EditSettings::default(),
            subtitles: Vec::new(),
            style: SubtitleStyle::default(),
            audio_tracks: Vec::new(),
            encoding: EncodingConfig::default(),
            target_height: None,
        }
    }
}

/// A compiled render: the command plus the temporary track artifact the
/// runner must delete once the process exits.
#[derive(Debug)]
pub struct CompiledRender {
    pub command: FfmpegCommand,
    pub track_file: Option<PathBuf>,
    pub info: VideoInfo,
}

/// Probe the input and compile the full render command.
pub async fn compile_render(opts: &RenderOptions) -> MediaResult<CompiledRender> {
    let info = probe(&opts.input).await?;
    compile_render_with_info(opts, &info)
}

/// Compile against an already-probed [`VideoInfo`].
pub fn compile_render_with_info(
    opts: &RenderOptions,
    info: &VideoInfo,
) -> MediaResult<CompiledRender> {
    let settings = &opts.settings;

    if settings.ignored_speed_sections() > 0 {
        warn!(
            ignored = settings.ignored_speed_sections(),
            "Multiple speed sections are unsupported; honoring the first only"
        );
    }
    if !settings.appended_clips.is_empty() {
        warn!(
            clips = settings.appended_clips.len(),
            "Appended clips are concatenated upstream; ignoring here"
        );
    }

    let (start, duration) = settings.trim.resolve(info.duration);
    let speed = settings.speed();

    let mut cmd = FfmpegCommand::new(&opts.output);

    // Main input carries the trim flags; all other inputs are untouched.
    let mut main_args = Vec::new();
    if start > 0.0 {
        main_args.extend(["-ss".to_string(), format_seconds(start)]);
    }
    if start > 0.0 || settings.trim.end.is_some() {
        main_args.extend(["-t".to_string(), format_seconds(duration)]);
    }
    cmd.input_with_args(&opts.input, main_args);

    // Track file next to the output, burned in as the last full-frame stage.
    let track_file = write_track_artifact(opts, info)?;

    let mut chain = build_video_chain(settings, info, duration);

    if let Some(height) = opts.target_height {
        chain.push(format!("scale=-2:{}", even(height)));
    }

    if let Some(ref track) = track_file {
        chain.push(format!("ass={}", escape_filter_path(track)));
    }

    // Image overlays: declare existing files as inputs, scale each, then
    // composite with a time-window visibility expression.
    for overlay in &settings.image_overlays {
        let path = opts.media_dir.join(&overlay.file);
        if !path.exists() {
            warn!(file = %overlay.file, "Image overlay file missing; skipping");
            continue;
        }
        let index = cmd.input(&path);

        let target_width = even(
            (info.width as f64 * overlay.width.clamp(0.0, 100.0) / 100.0).round() as u32,
        )
        .max(2);
        let scale = if overlay.opacity < 1.0 {
            format!(
                "scale={}:-1,format=rgba,colorchannelmixer=aa={:.2}",
                target_width, overlay.opacity
            )
        } else {
            format!("scale={}:-1", target_width)
        };
        let scaled = chain.push_source(format!("{}:v", index), scale);

        chain.push_merge(
            vec![scaled],
            format!(
                "overlay=x=(W-w)*{:.4}:y=(H-h)*{:.4}:enable='between(t,{:.2},{:.2})'",
                overlay.x.clamp(0.0, 100.0) / 100.0,
                overlay.y.clamp(0.0, 100.0) / 100.0,
                overlay.start,
                overlay.end,
            ),
        );
    }

    // Audio graph: delay and scale each extra track, mix with the primary
    // stream first so its duration governs the mix.
    let mut audio_chain = crate::filters::FilterChain::with_prefix("0:a", "a");
    let extra_tracks: Vec<(usize, &AudioTrack)> = opts
        .audio_tracks
        .iter()
        .filter_map(|track| {
            let path = opts.media_dir.join(&track.file);
            if path.exists() {
                Some((cmd.input(&path), track))
            } else {
                warn!(file = %track.file, "Audio track file missing; skipping");
                None
            }
        })
        .collect();

    if !extra_tracks.is_empty() {
        let mut mix_inputs = Vec::new();
        for (index, track) in &extra_tracks {
            let delay_ms = (track.start.max(0.0) * 1000.0).round() as u64;
            let prepared = audio_chain.push_source(
                format!("{}:a", index),
                format!("adelay={}:all=1,volume={:.3}", delay_ms, track.volume),
            );
            mix_inputs.push(prepared);
        }
        audio_chain.push_merge(
            mix_inputs,
            format!("amix=inputs={}:duration=first", extra_tracks.len() + 1),
        );
    }
    if speed != 1.0 {
        audio_chain.push(atempo_chain(speed));
    }

    // Mappings: rewritten streams when a stage ran, raw pads otherwise. The
    // audio mapping stays tolerant when untouched (some sources lack audio).
    let video_label = chain.output().to_string();
    let video_filtered = !chain.is_empty();
    let audio_label = audio_chain.output().to_string();
    let audio_filtered = !audio_chain.is_empty();

    cmd.stages(chain.into_stages());
    cmd.stages(audio_chain.into_stages());

    if video_filtered {
        cmd.map_label(&video_label);
    } else {
        cmd.map_stream("0:v");
    }
    if audio_filtered {
        cmd.map_label(&audio_label);
    } else {
        cmd.map_stream("0:a?");
    }

    cmd.output_args(opts.encoding.to_output_args());

    debug!(
        input = %opts.input.display(),
        output = %opts.output.display(),
        stages = cmd.filter_stages().len(),
        "Compiled render command"
    );

    Ok(CompiledRender {
        command: cmd,
        track_file,
        info: info.clone(),
    })
}

/// Write the ASS track next to the output when any subtitles or text
/// overlays exist.
fn write_track_artifact(opts: &RenderOptions, info: &VideoInfo) -> MediaResult<Option<PathBuf>> {
    if opts.subtitles.is_empty() && opts.settings.text_overlays.is_empty() {
        return Ok(None);
    }

    let document = compile_track(
        &opts.subtitles,
        &opts.style,
        &opts.settings.text_overlays,
        info.width,
        info.height,
    );
    let path = opts.output.with_extension("ass");
    write_track(&path, &document)?;
    Ok(Some(path))
}

/// Chain `atempo` stages into the filter's supported 0.5-2.0 range.
fn atempo_chain(speed: f64) -> String {
    let mut remaining = speed;
    let mut parts = Vec::new();
    while remaining > 2.0 {
        parts.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        parts.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    parts.push(format!("atempo={:.4}", remaining));
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutroom_models::{ImageOverlay, KenBurns, SpeedSection, Trim};
    use tempfile::TempDir;

    fn info() -> VideoInfo {
        VideoInfo {
            width: 1920,
            height: 1080,
            duration: 60.0,
            fps: 30.0,
        }
    }

    fn base_options(dir: &TempDir) -> RenderOptions {
        RenderOptions::new(
            dir.path().join("clip.mp4"),
            dir.path().join("clip_rendered.mp4"),
            dir.path(),
        )
    }

    #[test]
    fn test_passthrough_maps_raw_streams() {
        let dir = TempDir::new().unwrap();
        let opts = base_options(&dir);
        let compiled = compile_render_with_info(&opts, &info()).unwrap();

        let args = compiled.command.build_args();
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(args.contains(&"0:v".to_string()));
        assert!(args.contains(&"0:a?".to_string()));
        assert!(compiled.track_file.is_none());
    }

    #[test]
    fn test_trim_flags_only_on_main_input() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.settings.trim = Trim {
            start: 5.0,
            end: Some(15.0),
        };
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();
        opts.settings.image_overlays.push(ImageOverlay {
            file: "logo.png".to_string(),
            start: 0.0,
            end: 5.0,
            x: 0.0,
            y: 0.0,
            width: 25.0,
            opacity: 1.0,
        });

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let args = compiled.command.build_args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "00:00:05.000");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "00:00:10.000");

        // Trim flags precede the first -i; the overlay input follows untouched.
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < first_i && t < first_i);
        let last_i = args.iter().rposition(|a| a == "-i").unwrap();
        assert!(args[last_i + 1].ends_with("logo.png"));
    }

    #[test]
    fn test_subtitles_produce_track_file_and_burn_in_stage() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.subtitles.push(SubtitleSegment::new(1.0, 3.5, "hello"));

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let track = compiled.track_file.as_ref().unwrap();
        assert!(track.exists());
        assert_eq!(track.extension().unwrap(), "ass");

        let graph = compiled.command.filter_graph().unwrap();
        assert!(graph.contains("ass="));
        // The rewritten stream is mapped, not the raw pad.
        let args = compiled.command.build_args();
        assert!(!args.contains(&"0:v".to_string()));
    }

    #[test]
    fn test_missing_overlay_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.settings.image_overlays.push(ImageOverlay {
            file: "missing.png".to_string(),
            start: 0.0,
            end: 5.0,
            x: 50.0,
            y: 50.0,
            width: 25.0,
            opacity: 1.0,
        });

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        assert!(!compiled.command.has_filters());
        let args = compiled.command.build_args();
        // Only the main input was declared.
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
    }

    #[test]
    fn test_image_overlay_scales_then_composites_with_window() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();
        opts.settings.image_overlays.push(ImageOverlay {
            file: "logo.png".to_string(),
            start: 2.0,
            end: 6.0,
            x: 100.0,
            y: 0.0,
            width: 25.0,
            opacity: 0.8,
        });

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let graph = compiled.command.filter_graph().unwrap();
        // 25% of 1920 = 480, already even.
        assert!(graph.contains("[1:v]scale=480:-1,format=rgba,colorchannelmixer=aa=0.80[v1]"));
        assert!(graph.contains("overlay=x=(W-w)*1.0000:y=(H-h)*0.0000:enable='between(t,2.00,6.00)'"));
    }

    #[test]
    fn test_two_audio_tracks_mix_with_primary_first() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        std::fs::write(dir.path().join("music.mp3"), b"mp3").unwrap();
        std::fs::write(dir.path().join("voice.mp3"), b"mp3").unwrap();
        opts.audio_tracks = vec![
            AudioTrack {
                file: "music.mp3".to_string(),
                start: 0.0,
                volume: 1.0,
            },
            AudioTrack {
                file: "voice.mp3".to_string(),
                start: 2.0,
                volume: 0.5,
            },
        ];

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let graph = compiled.command.filter_graph().unwrap();

        assert!(graph.contains("[1:a]adelay=0:all=1,volume=1.000[a1]"));
        assert!(graph.contains("[2:a]adelay=2000:all=1,volume=0.500[a2]"));
        // Primary stream leads the mix so its duration governs.
        assert!(graph.contains("[0:a][a1][a2]amix=inputs=3:duration=first[a3]"));

        let args = compiled.command.build_args();
        assert!(args.contains(&"[a3]".to_string()));
        assert!(!args.contains(&"0:a?".to_string()));
    }

    #[test]
    fn test_speed_applies_matching_audio_tempo() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.settings.speed_sections = vec![SpeedSection {
            start: 0.0,
            end: 60.0,
            speed: 2.0,
        }];

        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let graph = compiled.command.filter_graph().unwrap();
        assert!(graph.contains("setpts=PTS/2"));
        assert!(graph.contains("[0:a]atempo=2.0000[a1]"));
    }

    #[test]
    fn test_atempo_chains_beyond_filter_range() {
        assert_eq!(atempo_chain(1.5), "atempo=1.5000");
        assert_eq!(atempo_chain(5.0), "atempo=2.0,atempo=2.0,atempo=1.2500");
        assert_eq!(atempo_chain(0.25), "atempo=0.5,atempo=0.5000");
    }

    #[test]
    fn test_disabled_ken_burns_never_reaches_the_graph() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.settings.ken_burns = KenBurns {
            enabled: false,
            zoom_start: 1.0,
            zoom_end: 1.5,
            ..Default::default()
        };
        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        assert!(compiled.command.filter_graph().is_none());
    }

    #[test]
    fn test_preview_target_height_adds_even_scale() {
        let dir = TempDir::new().unwrap();
        let mut opts = base_options(&dir);
        opts.target_height = Some(481);
        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let graph = compiled.command.filter_graph().unwrap();
        assert!(graph.contains("scale=-2:480"));
    }

    #[test]
    fn test_encoder_flags_appended() {
        let dir = TempDir::new().unwrap();
        let opts = base_options(&dir);
        let compiled = compile_render_with_info(&opts, &info()).unwrap();
        let args = compiled.command.build_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(
            args.last().unwrap(),
            &dir.path().join("clip_rendered.mp4").to_string_lossy().to_string()
        );
    }
}
