use std::collections::HashMap;

use chrono::{DateTime, Utc};
use seglens_core::job::{JobStatus, JobSummary};
use seglens_core::mapping::ColumnMapping;
use serde::{Deserialize, Serialize};

/// Acknowledgement returned when the engine accepts a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAck {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// Status payload for a remote job.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineJob {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress: Option<u8>,
}

/// Column preview produced by the engine for formats we do not parse locally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvPreview {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub sample_rows: Vec<HashMap<String, String>>,
    #[serde(default)]
    pub suggested_mapping: Option<ColumnMapping>,
}

/// One page of the engine's job listing.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobSummary>,
    pub total: u64,
}

/// Analysis options forwarded with a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOptions {
    pub clustering_method: String,
    pub include_comparison: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            clustering_method: "kmeans".to_string(),
            include_comparison: false,
        }
    }
}
