//! Session-keyed state: one current upload, one current mapping, and the jobs
//! created in that session.

use std::collections::HashMap;
use std::sync::Arc;

use seglens_core::job::Job;
use seglens_core::mapping::ColumnMapping;
use seglens_core::upload::UploadRecord;
use tokio::sync::RwLock;

use crate::jobs::{DemoSource, JobCell};
use crate::StoreError;

#[derive(Default)]
struct Session {
    current_upload: Option<UploadRecord>,
    current_mapping: Option<ColumnMapping>,
    jobs: HashMap<String, Arc<JobCell>>,
}

/// All per-session state, keyed by an explicit session identifier. Cloning is
/// cheap; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new upload as the session's current one. A previous upload is
    /// superseded, not merged.
    pub async fn set_current_upload(&self, session_id: &str, record: UploadRecord) {
        let mut sessions = self.inner.write().await;
        sessions.entry(session_id.to_string()).or_default().current_upload = Some(record);
    }

    /// The session's current upload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCurrentUpload`] when nothing has been uploaded.
    pub async fn current_upload(&self, session_id: &str) -> Result<UploadRecord, StoreError> {
        let sessions = self.inner.read().await;
        sessions
            .get(session_id)
            .and_then(|s| s.current_upload.clone())
            .ok_or(StoreError::NoCurrentUpload)
    }

    pub async fn set_current_mapping(&self, session_id: &str, mapping: ColumnMapping) {
        let mut sessions = self.inner.write().await;
        sessions.entry(session_id.to_string()).or_default().current_mapping = Some(mapping);
    }

    /// The session's saved column mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoMappingSaved`] when none has been saved.
    pub async fn current_mapping(&self, session_id: &str) -> Result<ColumnMapping, StoreError> {
        let sessions = self.inner.read().await;
        sessions
            .get(session_id)
            .and_then(|s| s.current_mapping.clone())
            .ok_or(StoreError::NoMappingSaved)
    }

    /// Register a newly created job and return its cell.
    pub async fn insert_job(
        &self,
        session_id: &str,
        job: Job,
        demo: Option<DemoSource>,
    ) -> Arc<JobCell> {
        let job_id = job.job_id.clone();
        let cell = Arc::new(JobCell::new(job, demo));
        let mut sessions = self.inner.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .jobs
            .insert(job_id, Arc::clone(&cell));
        cell
    }

    /// Look up a job in the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::JobNotFound`] for unknown ids, including ids
    /// that belonged to a different session.
    pub async fn job(&self, session_id: &str, job_id: &str) -> Result<Arc<JobCell>, StoreError> {
        let sessions = self.inner.read().await;
        sessions
            .get(session_id)
            .and_then(|s| s.jobs.get(job_id).cloned())
            .ok_or(StoreError::JobNotFound)
    }

    /// Remove a job and its cached result. Permitted in any state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::JobNotFound`] for unknown ids.
    pub async fn remove_job(&self, session_id: &str, job_id: &str) -> Result<(), StoreError> {
        let mut sessions = self.inner.write().await;
        sessions
            .get_mut(session_id)
            .and_then(|s| s.jobs.remove(job_id))
            .map(|_| ())
            .ok_or(StoreError::JobNotFound)
    }
}
