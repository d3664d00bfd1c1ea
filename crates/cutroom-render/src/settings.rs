//! Per-media settings store.
//!
//! The web layer persists the user's edit state as JSON blobs keyed by the
//! media base name; the manager reads them back when building render
//! options. A missing blob means defaults, a malformed one is an error.

use std::path::{Path, PathBuf};

use cutroom_models::{AudioTrack, EditSettings, SubtitleSegment, SubtitleStyle};
use serde::de::DeserializeOwned;

use crate::error::RenderResult;

/// Everything persisted for one media file.
#[derive(Debug, Clone, Default)]
pub struct MediaSettings {
    pub subtitles: Vec<SubtitleSegment>,
    pub style: SubtitleStyle,
    pub audio_tracks: Vec<AudioTrack>,
    pub edit: EditSettings,
}

/// Reads settings blobs from the content directory.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    content_dir: PathBuf,
}

impl SettingsStore {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    /// Load all settings for a media base name, defaulting missing blobs.
    pub async fn load(&self, base_name: &str) -> RenderResult<MediaSettings> {
        Ok(MediaSettings {
            subtitles: self
                .read_json(&format!("{}.subtitles.json", base_name))
                .await?
                .unwrap_or_default(),
            style: self
                .read_json(&format!("{}.style.json", base_name))
                .await?
                .unwrap_or_default(),
            audio_tracks: self
                .read_json(&format!("{}.audio.json", base_name))
                .await?
                .unwrap_or_default(),
            edit: self
                .read_json(&format!("{}.edit.json", base_name))
                .await?
                .unwrap_or_default(),
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> RenderResult<Option<T>> {
        let path = self.content_dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Base name of a media file: the stem the settings blobs are keyed by.
pub fn media_base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_media_base_name() {
        assert_eq!(media_base_name("clip.mp4"), "clip");
        assert_eq!(media_base_name("my.holiday.mov"), "my.holiday");
        assert_eq!(media_base_name("noextension"), "noextension");
    }

    #[tokio::test]
    async fn test_missing_blobs_default() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());

        let settings = store.load("clip").await.unwrap();
        assert!(settings.subtitles.is_empty());
        assert!(settings.edit.filters.is_neutral());
        assert_eq!(settings.style, SubtitleStyle::default());
    }

    #[tokio::test]
    async fn test_blobs_load_by_base_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("clip.subtitles.json"),
            r#"[{"start":0.0,"end":1.0,"text":"hi"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("clip.edit.json"),
            r#"{"trim":{"start":2.0}}"#,
        )
        .unwrap();

        let store = SettingsStore::new(dir.path());
        let settings = store.load("clip").await.unwrap();
        assert_eq!(settings.subtitles.len(), 1);
        assert_eq!(settings.edit.trim.start, 2.0);
        // Blobs for other media are invisible.
        let other = store.load("other").await.unwrap();
        assert!(other.subtitles.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_blob_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip.edit.json"), "not json").unwrap();

        let store = SettingsStore::new(dir.path());
        assert!(store.load("clip").await.is_err());
    }
}
