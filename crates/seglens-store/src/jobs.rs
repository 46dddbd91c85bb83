//! Per-job state cell.
//!
//! A [`JobCell`] owns one job behind an async mutex. For demo jobs the mutex
//! is what serializes the check-then-synthesize-then-cache step: even under
//! concurrent polls only one caller materializes the result, and every later
//! poll returns the same cached `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use seglens_core::demo;
use seglens_core::error::CoreError;
use seglens_core::job::{Job, JobStatus};
use seglens_core::mapping::ColumnMapping;
use seglens_core::result::AnalysisResult;
use tokio::sync::Mutex;

/// Snapshot of the upload taken at job creation, from which a demo result is
/// synthesized. Captured eagerly so a later upload cannot change the result.
#[derive(Debug, Clone)]
pub struct DemoSource {
    pub sample_rows: Vec<HashMap<String, String>>,
    pub mapping: ColumnMapping,
}

struct JobSlot {
    job: Job,
    demo: Option<DemoSource>,
    result: Option<Arc<AnalysisResult>>,
}

pub struct JobCell {
    slot: Mutex<JobSlot>,
}

impl JobCell {
    #[must_use]
    pub fn new(job: Job, demo: Option<DemoSource>) -> Self {
        Self {
            slot: Mutex::new(JobSlot {
                job,
                demo,
                result: None,
            }),
        }
    }

    /// Current job state without advancing anything.
    pub async fn snapshot(&self) -> Job {
        self.slot.lock().await.job.clone()
    }

    /// Poll the job, advancing demo-mode state from elapsed time.
    ///
    /// Remote jobs are returned as-is (their refresh happens through the
    /// delegate via [`JobCell::apply_remote`]). Demo jobs derive their status
    /// from `now - created_at`; on the first observation past the completion
    /// threshold the result is synthesized exactly once and cached. Progress
    /// never decreases, terminal states never change.
    pub async fn poll(&self, now: DateTime<Utc>) -> Job {
        let mut guard = self.slot.lock().await;
        let slot = &mut *guard;

        let Some(source) = &slot.demo else {
            return slot.job.clone();
        };
        if slot.job.status.is_terminal() {
            return slot.job.clone();
        }

        let (derived, progress) = demo::status_at(slot.job.created_at, now);
        slot.job.progress = Some(slot.job.progress.unwrap_or(0).max(progress));

        match derived {
            JobStatus::Processing => slot.job.status = JobStatus::Processing,
            JobStatus::Completed => {
                if slot.result.is_none() {
                    let result =
                        demo::synthesize(&slot.job.job_id, &source.sample_rows, &source.mapping);
                    slot.result = Some(Arc::new(result));
                }
                slot.job.status = JobStatus::Completed;
                slot.job.completed_at.get_or_insert(now);
                slot.job.progress = Some(100);
            }
            _ => {}
        }

        slot.job.clone()
    }

    /// The cached analysis result, if the job has completed in demo mode.
    pub async fn result(&self) -> Option<Arc<AnalysisResult>> {
        self.slot.lock().await.result.clone()
    }

    /// Overwrite local state with a status refresh from the remote engine.
    pub async fn apply_remote(
        &self,
        status: JobStatus,
        error_message: Option<String>,
        completed_at: Option<DateTime<Utc>>,
        progress: Option<u8>,
    ) -> Job {
        let mut guard = self.slot.lock().await;
        guard.job.status = status;
        if error_message.is_some() {
            guard.job.error_message = error_message;
        }
        if completed_at.is_some() {
            guard.job.completed_at = completed_at;
        }
        if progress.is_some() {
            guard.job.progress = progress;
        }
        guard.job.clone()
    }

    /// Cancel the job locally.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] from a terminal state.
    pub async fn cancel(&self) -> Result<Job, CoreError> {
        let mut guard = self.slot.lock().await;
        guard.job.cancel()?;
        Ok(guard.job.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use seglens_core::job::SourceMode;

    use super::*;

    fn demo_source() -> DemoSource {
        let mut row = HashMap::new();
        row.insert("Total_GHS".to_string(), "1,200.50".to_string());
        DemoSource {
            sample_rows: vec![row; 3],
            mapping: ColumnMapping {
                customer_id: Some("Cust_Ref_ID".to_string()),
                invoice_date: Some("Transaction_Date".to_string()),
                invoice_id: Some("Inv_Num".to_string()),
                amount: Some("Total_GHS".to_string()),
                ..ColumnMapping::default()
            },
        }
    }

    fn demo_cell_created_at(created_at: DateTime<Utc>) -> JobCell {
        let job = Job::new(
            "demo_cell".to_string(),
            SourceMode::Demo,
            "sales.csv".to_string(),
            created_at,
        );
        JobCell::new(job, Some(demo_source()))
    }

    #[tokio::test]
    async fn demo_job_follows_the_poll_timeline() {
        let t0 = Utc::now();
        let cell = demo_cell_created_at(t0);

        let job = cell.poll(t0 + Duration::seconds(1)).await;
        assert_eq!(job.status, JobStatus::Pending);

        let job = cell.poll(t0 + Duration::seconds(5)).await;
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, Some(50));

        let job = cell.poll(t0 + Duration::seconds(11)).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, Some(100));
        assert!(job.completed_at.is_some());

        let result = cell.result().await.expect("result materialized");
        assert_eq!(result.segments.len(), 5);
        let sum: f64 = result.segments.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn repeated_polls_after_completion_return_the_same_cached_result() {
        let t0 = Utc::now() - Duration::seconds(30);
        let cell = demo_cell_created_at(t0);

        cell.poll(Utc::now()).await;
        let first = cell.result().await.expect("first result");
        for _ in 0..5 {
            cell.poll(Utc::now()).await;
            let again = cell.result().await.expect("cached result");
            assert!(Arc::ptr_eq(&first, &again), "result was recomputed");
        }
    }

    #[tokio::test]
    async fn concurrent_polls_materialize_exactly_once() {
        let t0 = Utc::now() - Duration::seconds(30);
        let cell = Arc::new(demo_cell_created_at(t0));

        let a = tokio::spawn({
            let cell = Arc::clone(&cell);
            async move { cell.poll(Utc::now()).await }
        });
        let b = tokio::spawn({
            let cell = Arc::clone(&cell);
            async move { cell.poll(Utc::now()).await }
        });
        let (ja, jb) = (a.await.expect("join"), b.await.expect("join"));
        assert_eq!(ja.status, JobStatus::Completed);
        assert_eq!(jb.status, JobStatus::Completed);

        let r1 = cell.result().await.expect("result");
        let r2 = cell.result().await.expect("result");
        assert!(Arc::ptr_eq(&r1, &r2));
    }

    #[tokio::test]
    async fn progress_never_decreases_even_with_out_of_order_polls() {
        let t0 = Utc::now();
        let cell = demo_cell_created_at(t0);
        let job = cell.poll(t0 + Duration::seconds(8)).await;
        assert_eq!(job.progress, Some(80));
        // An earlier "now" (clock wobble between callers) must not roll back.
        let job = cell.poll(t0 + Duration::seconds(4)).await;
        assert_eq!(job.progress, Some(80));
    }

    #[tokio::test]
    async fn a_single_poll_after_a_long_gap_completes_the_job() {
        let t0 = Utc::now() - Duration::minutes(30);
        let cell = demo_cell_created_at(t0);
        let job = cell.poll(Utc::now()).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert!(cell.result().await.is_some());
    }

    #[tokio::test]
    async fn cancelled_demo_job_stays_cancelled_and_never_materializes() {
        let t0 = Utc::now();
        let cell = demo_cell_created_at(t0);
        cell.cancel().await.expect("cancel pending job");

        let job = cell.poll(t0 + Duration::seconds(60)).await;
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(cell.result().await.is_none());
    }

    #[tokio::test]
    async fn cancel_after_completion_is_an_illegal_transition() {
        let t0 = Utc::now() - Duration::seconds(30);
        let cell = demo_cell_created_at(t0);
        cell.poll(Utc::now()).await;
        let err = cell.cancel().await.expect_err("must reject");
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                from: JobStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn remote_jobs_do_not_advance_on_poll() {
        let job = Job::new(
            "remote-1".to_string(),
            SourceMode::Remote,
            "sales.csv".to_string(),
            Utc::now() - Duration::minutes(5),
        );
        let cell = JobCell::new(job, None);
        let polled = cell.poll(Utc::now()).await;
        assert_eq!(polled.status, JobStatus::Pending);

        let refreshed = cell
            .apply_remote(JobStatus::Failed, Some("bad data".to_string()), None, None)
            .await;
        assert_eq!(refreshed.status, JobStatus::Failed);
        assert_eq!(refreshed.error_message.as_deref(), Some("bad data"));
    }
}
