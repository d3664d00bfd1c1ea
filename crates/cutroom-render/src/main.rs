//! Render worker binary: submits one render job and follows it to a
//! terminal state. The HTTP layer normally drives the manager; this is the
//! ops-tool equivalent for local runs and smoke checks.

use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cutroom_render::{RenderConfig, RenderManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("cutroom=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let media_file = match std::env::args().nth(1) {
        Some(name) => name,
        None => bail!("usage: cutroom-render <media-file>"),
    };

    let config = RenderConfig::from_env();
    info!("Render config: {:?}", config);

    cutroom_media::check_ffmpeg().context("ffmpeg is required")?;
    cutroom_media::check_ffprobe().context("ffprobe is required")?;

    let manager = RenderManager::new(config);
    let id = manager
        .start_render(&media_file)
        .await
        .context("render request rejected")?;
    info!(job_id = %id, "Render accepted");

    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let status = manager.status(&id).await?;
        if !status.status.is_terminal() {
            continue;
        }
        match status.error {
            None => {
                info!(
                    job_id = %id,
                    path = status.path.as_deref().unwrap_or_default(),
                    "Render complete"
                );
                return Ok(());
            }
            Some(message) => {
                error!(job_id = %id, error = %message, "Render failed");
                std::process::exit(1);
            }
        }
    }
}
