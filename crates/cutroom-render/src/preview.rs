//! Single-flight preview rendering.
//!
//! Structurally the same pipeline as a full render, but over a short
//! clamped window at reduced resolution, with encoding tuned for speed.
//! Only one preview runs at a time process-wide; a concurrent request is
//! rejected immediately rather than queued, and no job record is created.

use cutroom_media::{compile_render_with_info, probe, RenderOptions};
use cutroom_models::{EncodingConfig, Trim};
use tracing::debug;
use uuid::Uuid;

use crate::error::{RenderError, RenderResult};
use crate::manager::{run_encode, RenderManager};
use crate::settings::media_base_name;

impl RenderManager {
    /// Render a short preview clip starting at `at_secs` and return its
    /// bytes. The temporary output file is deleted before returning.
    pub async fn render_preview(&self, media_file: &str, at_secs: f64) -> RenderResult<Vec<u8>> {
        let _guard = self
            .preview_gate
            .try_lock()
            .map_err(|_| RenderError::PreviewBusy)?;

        let input = self.config.content_dir.join(media_file);
        let info = probe(&input).await?;

        let base = media_base_name(media_file);
        let media = self.settings.load(&base).await?;

        let (start, end) = preview_window(at_secs, info.duration, self.config.preview_duration);
        let mut edit = media.edit;
        edit.trim = Trim {
            start,
            end: Some(end),
        };

        let output = std::env::temp_dir().join(format!("cutroom-preview-{}.mp4", Uuid::new_v4()));
        debug!(media = media_file, start, end, output = %output.display(), "Rendering preview");

        let opts = RenderOptions {
            input,
            output: output.clone(),
            media_dir: self.config.content_dir.clone(),
            settings: edit,
            subtitles: media.subtitles,
            style: media.style,
            audio_tracks: media.audio_tracks,
            encoding: EncodingConfig::for_preview().with_threads(self.config.encoder_threads),
            target_height: Some(self.config.preview_height),
        };

        let compiled = compile_render_with_info(&opts, &info)?;
        let encode_result = run_encode(compiled).await;

        let read_result = match encode_result {
            Ok(()) => tokio::fs::read(&output).await.map_err(RenderError::from),
            Err(e) => Err(e),
        };
        // The clip is served from memory; the temp file never outlives the call.
        let _ = tokio::fs::remove_file(&output).await;
        read_result
    }
}

/// Clamp the preview window into the media duration.
fn preview_window(at_secs: f64, media_duration: f64, preview_len: f64) -> (f64, f64) {
    let start = at_secs.clamp(0.0, media_duration);
    let end = (start + preview_len).min(media_duration);
    (start, end)
}
