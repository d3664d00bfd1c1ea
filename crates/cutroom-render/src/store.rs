//! Durable job status storage.
//!
//! The state machine only talks to the [`JobStatusStore`] seam: production
//! uses the filesystem store (one JSON file per job id, surviving process
//! restarts), tests swap in the in-memory store without touching the
//! manager.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use cutroom_models::{JobId, JobStatus};

use crate::error::RenderResult;

/// Key-value storage for job status records.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Persist the status record for a job id, replacing any previous value.
    async fn put(&self, id: &JobId, status: &JobStatus) -> RenderResult<()>;

    /// Read the status record for a job id, `None` when unknown.
    async fn get(&self, id: &JobId) -> RenderResult<Option<JobStatus>>;
}

/// Filesystem-backed store: `{status_dir}/{job_id}.json`.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FsJobStore {
    dir: PathBuf,
}

impl FsJobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl JobStatusStore for FsJobStore {
    async fn put(&self, id: &JobId, status: &JobStatus) -> RenderResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.record_path(id);
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_vec_pretty(status)?;
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, id: &JobId) -> RenderResult<Option<JobStatus>> {
        let path = self.record_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<String, JobStatus>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobStatusStore for MemoryJobStore {
    async fn put(&self, id: &JobId, status: &JobStatus) -> RenderResult<()> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .insert(id.to_string(), status.clone());
        Ok(())
    }

    async fn get(&self, id: &JobId) -> RenderResult<Option<JobStatus>> {
        Ok(self
            .records
            .lock()
            .expect("store lock poisoned")
            .get(id.as_str())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FsJobStore::new(dir.path());
        let id = JobId::from_string("clip-1");

        assert!(store.get(&id).await.unwrap().is_none());

        store.put(&id, &JobStatus::rendering()).await.unwrap();
        let status = store.get(&id).await.unwrap().unwrap();
        assert_eq!(status, JobStatus::rendering());

        // Terminal status replaces the record.
        store
            .put(&id, &JobStatus::done("output/clip_rendered.mp4", "clip_rendered.mp4"))
            .await
            .unwrap();
        let status = store.get(&id).await.unwrap().unwrap();
        assert_eq!(status.path.as_deref(), Some("output/clip_rendered.mp4"));
    }

    #[tokio::test]
    async fn test_fs_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let id = JobId::from_string("clip-2");

        {
            let store = FsJobStore::new(dir.path());
            store.put(&id, &JobStatus::error("boom")).await.unwrap();
        }

        // A fresh store instance over the same directory sees the record.
        let store = FsJobStore::new(dir.path());
        let status = store.get(&id).await.unwrap().unwrap();
        assert_eq!(status.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryJobStore::new();
        let id = JobId::from_string("clip-3");
        assert!(store.is_empty());

        store.put(&id, &JobStatus::rendering()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).await.unwrap().is_some());
    }
}
