//! Asynchronous render job manager.
//!
//! Accepts render requests, enforces the concurrency ceiling, launches the
//! compiled command as a detached process and persists the job lifecycle
//! (`rendering -> done | error`) through the status store. The accepting
//! call returns as soon as the job is admitted; everything afterwards is
//! only observable via the status record.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use cutroom_media::{
    check_ffmpeg, compile_render, looks_like_error, parse_progress_line, CompiledRender,
    RenderOptions, RenderProgress,
};
use cutroom_models::{EncodingConfig, JobId, JobStatus};
use metrics::{counter, gauge};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, warn};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::JobLogger;
use crate::settings::{media_base_name, SettingsStore};
use crate::store::{FsJobStore, JobStatusStore};

/// Owns the concurrency gates and the status store.
///
/// The render ceiling is a bounded semaphore and the preview gate a
/// single-slot lock, both owned by the instance so separate managers (e.g.
/// in tests) never share state.
pub struct RenderManager {
    pub(crate) config: RenderConfig,
    pub(crate) store: Arc<dyn JobStatusStore>,
    pub(crate) settings: SettingsStore,
    pub(crate) render_slots: Arc<Semaphore>,
    pub(crate) preview_gate: Arc<Mutex<()>>,
}

impl RenderManager {
    /// Manager backed by the filesystem status store.
    pub fn new(config: RenderConfig) -> Self {
        let store = Arc::new(FsJobStore::new(config.status_dir.clone()));
        Self::with_store(config, store)
    }

    /// Manager with an explicit status store (tests use the memory store).
    pub fn with_store(config: RenderConfig, store: Arc<dyn JobStatusStore>) -> Self {
        let settings = SettingsStore::new(config.content_dir.clone());
        let render_slots = Arc::new(Semaphore::new(config.max_concurrent_renders));
        Self {
            config,
            store,
            settings,
            render_slots,
            preview_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Number of renders currently holding a slot.
    pub fn active_renders(&self) -> usize {
        self.config.max_concurrent_renders - self.render_slots.available_permits()
    }

    /// Accept a render request.
    ///
    /// Rejects with [`RenderError::Capacity`] at the ceiling, without
    /// creating a status record. On acceptance the initial `rendering`
    /// record is persisted and the identifier returned immediately; the
    /// encode runs in a detached task.
    pub async fn start_render(&self, media_file: &str) -> RenderResult<JobId> {
        let permit = self
            .render_slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| RenderError::Capacity {
                limit: self.config.max_concurrent_renders,
            })?;

        let base = media_base_name(media_file);
        let id = JobId::for_media(&base);
        self.store.put(&id, &JobStatus::rendering()).await?;

        counter!("cutroom_renders_accepted_total").increment(1);
        gauge!("cutroom_renders_active").increment(1.0);

        let config = self.config.clone();
        let settings = self.settings.clone();
        let store = Arc::clone(&self.store);
        let media_file = media_file.to_string();
        let job_id = id.clone();

        tokio::spawn(async move {
            // Held for the whole encode; dropping it releases the slot
            // exactly once per acceptance.
            let _permit = permit;

            let logger = JobLogger::new(&job_id, "render");
            logger.log_start(&media_file);

            let output = config
                .output_dir
                .join(format!("{}_rendered.mp4", base));
            let result = execute_render(&config, &settings, &media_file, &output).await;

            match &result {
                Ok(()) => logger.log_completion(&output.display().to_string()),
                Err(e) => logger.log_error(&e.to_string()),
            }

            finalize_job(store.as_ref(), &job_id, result, &output).await;
            gauge!("cutroom_renders_active").decrement(1.0);
        });

        Ok(id)
    }

    /// Pure read of the persisted status record.
    pub async fn status(&self, id: &JobId) -> RenderResult<JobStatus> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| RenderError::NotFound(id.to_string()))
    }
}

/// Build options from the persisted settings and run the encode.
async fn execute_render(
    config: &RenderConfig,
    settings: &SettingsStore,
    media_file: &str,
    output: &Path,
) -> RenderResult<()> {
    let base = media_base_name(media_file);
    let media = settings.load(&base).await?;

    tokio::fs::create_dir_all(&config.output_dir).await?;

    let opts = RenderOptions {
        input: config.content_dir.join(media_file),
        output: output.to_path_buf(),
        media_dir: config.content_dir.clone(),
        settings: media.edit,
        subtitles: media.subtitles,
        style: media.style,
        audio_tracks: media.audio_tracks,
        // Thread cap keeps the encoder's memory footprint bounded.
        encoding: EncodingConfig::default().with_threads(config.encoder_threads),
        target_height: None,
    };

    let compiled = compile_render(&opts).await?;
    run_encode(compiled).await
}

/// Spawn the compiled command and wait for it, deleting the temporary track
/// file regardless of outcome.
pub(crate) async fn run_encode(compiled: CompiledRender) -> RenderResult<()> {
    let result = spawn_and_wait(&compiled).await;

    if let Some(ref track) = compiled.track_file {
        if let Err(e) = tokio::fs::remove_file(track).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %track.display(), error = %e, "Failed to remove track file");
            }
        }
    }

    result
}

async fn spawn_and_wait(compiled: &CompiledRender) -> RenderResult<()> {
    check_ffmpeg()?;

    let args = compiled.command.build_args();
    debug!(args = %args.join(" "), "Spawning encoder");

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        // Stdout is discarded; stderr is scanned line by line for progress
        // and error markers so encoder logs are never buffered whole.
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RenderError::Launch(e.to_string()))?;

    let stderr = child.stderr.take();
    let scan = tokio::spawn(async move {
        let mut last_error: Option<String> = None;
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            let mut progress = RenderProgress::default();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(snapshot) = parse_progress_line(&line, &mut progress) {
                    debug!(
                        out_time_secs = snapshot.out_time_secs(),
                        frame = snapshot.frame,
                        "Encode progress"
                    );
                } else if looks_like_error(&line) {
                    last_error = Some(line.trim().to_string());
                }
            }
        }
        last_error
    });

    // A crashing encoder surfaces here as an exit status, never as a panic
    // crossing the process boundary.
    let status = child.wait().await;
    let last_error = scan.await.unwrap_or(None);

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(RenderError::encode_exit(status.code(), last_error)),
        Err(e) => Err(RenderError::Launch(e.to_string())),
    }
}

/// Map the execution outcome onto the terminal status record.
pub(crate) async fn finalize_job(
    store: &dyn JobStatusStore,
    id: &JobId,
    result: RenderResult<()>,
    output: &Path,
) {
    let status = match result {
        Ok(()) => {
            counter!("cutroom_renders_completed_total").increment(1);
            let filename = output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            JobStatus::done(output.to_string_lossy(), filename)
        }
        Err(e) => {
            counter!("cutroom_renders_failed_total").increment(1);
            JobStatus::error(e.to_string())
        }
    };

    if let Err(e) = store.put(id, &status).await {
        error!(job_id = %id, error = %e, "Failed to persist terminal job status");
    }
}
