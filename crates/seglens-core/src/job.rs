//! Job lifecycle: statuses, source modes, and the transition rules that make
//! repeated status polling safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of an analysis job.
///
/// `Completed`, `Failed`, and `Cancelled` are terminal: no transition leaves
/// them. A job that does not exist yet has no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Where a job's results come from: the real analysis engine or the local
/// synthesizer. Chosen once at creation time; all later dispatch goes through
/// this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Remote,
    Demo,
}

/// The central entity of the subsystem. Owned by the job store; everything
/// else holds snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub source_mode: SourceMode,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Demo mode only, 0..=100, monotonically non-decreasing across polls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl Job {
    #[must_use]
    pub fn new(
        job_id: String,
        source_mode: SourceMode,
        filename: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            source_mode,
            filename,
            created_at,
            completed_at: None,
            error_message: None,
            progress: None,
        }
    }

    /// pending -> processing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] from any other state.
    pub fn begin(&mut self) -> Result<(), CoreError> {
        match self.status {
            JobStatus::Pending => {
                self.status = JobStatus::Processing;
                Ok(())
            }
            from => Err(CoreError::IllegalTransition {
                from,
                action: "begin processing",
            }),
        }
    }

    /// processing -> completed. The caller attaches the result separately so
    /// this type stays free of result ownership.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] unless currently processing.
    pub fn succeed(&mut self, completed_at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            JobStatus::Processing => {
                self.status = JobStatus::Completed;
                self.completed_at = Some(completed_at);
                Ok(())
            }
            from => Err(CoreError::IllegalTransition {
                from,
                action: "complete",
            }),
        }
    }

    /// processing -> failed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] unless currently processing.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CoreError> {
        match self.status {
            JobStatus::Processing => {
                self.status = JobStatus::Failed;
                self.error_message = Some(reason.into());
                Ok(())
            }
            from => Err(CoreError::IllegalTransition {
                from,
                action: "fail",
            }),
        }
    }

    /// pending|processing -> cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] from a terminal state.
    pub fn cancel(&mut self) -> Result<(), CoreError> {
        match self.status {
            JobStatus::Pending | JobStatus::Processing => {
                self.status = JobStatus::Cancelled;
                Ok(())
            }
            from => Err(CoreError::IllegalTransition {
                from,
                action: "cancel",
            }),
        }
    }
}

/// One row in a history listing. Optional fields are omitted from JSON when
/// absent so remote and local listings serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub filename: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Filters for history listings, forwarded verbatim to the remote engine when
/// one is configured.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}
