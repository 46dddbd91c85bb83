//! Local job history used when no remote engine is configured.
//!
//! The record set is static demo data; filtering and pagination follow the
//! same semantics the engine applies, so callers see one behavior regardless
//! of source.

use chrono::{DateTime, TimeZone, Utc};
use seglens_core::job::{HistoryQuery, JobStatus, JobSummary};

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// The static demo record set: five completed jobs, one failed, one still
/// processing.
#[must_use]
pub fn demo_history() -> Vec<JobSummary> {
    vec![
        JobSummary {
            job_id: "job_001".to_string(),
            filename: "Q3_Sales_Analysis_Final.csv".to_string(),
            status: JobStatus::Completed,
            created_at: ts(2026, 2, 5, 10, 30),
            completed_at: Some(ts(2026, 2, 5, 10, 35)),
            customer_count: Some(1240),
            segments_count: Some(5),
            progress: None,
            error_message: None,
        },
        JobSummary {
            job_id: "job_002".to_string(),
            filename: "Accra_Customer_Segment_v2.csv".to_string(),
            status: JobStatus::Completed,
            created_at: ts(2026, 2, 3, 14, 20),
            completed_at: Some(ts(2026, 2, 3, 14, 28)),
            customer_count: Some(856),
            segments_count: Some(4),
            progress: None,
            error_message: None,
        },
        JobSummary {
            job_id: "job_003".to_string(),
            filename: "Kumasi_Branch_Leads.csv".to_string(),
            status: JobStatus::Failed,
            created_at: ts(2026, 2, 1, 9, 15),
            completed_at: None,
            customer_count: None,
            segments_count: None,
            progress: None,
            error_message: Some("Invalid date format in column 3".to_string()),
        },
        JobSummary {
            job_id: "job_004".to_string(),
            filename: "Churn_Prediction_Feb.csv".to_string(),
            status: JobStatus::Processing,
            created_at: ts(2026, 1, 28, 16, 45),
            completed_at: None,
            customer_count: Some(2100),
            segments_count: None,
            progress: Some(65),
            error_message: None,
        },
        JobSummary {
            job_id: "job_005".to_string(),
            filename: "Jan_Performance_Review.csv".to_string(),
            status: JobStatus::Completed,
            created_at: ts(2026, 1, 20, 11, 0),
            completed_at: Some(ts(2026, 1, 20, 11, 12)),
            customer_count: Some(4320),
            segments_count: Some(6),
            progress: None,
            error_message: None,
        },
        JobSummary {
            job_id: "job_006".to_string(),
            filename: "December_Sales_Report.csv".to_string(),
            status: JobStatus::Completed,
            created_at: ts(2025, 12, 28, 10, 0),
            completed_at: Some(ts(2025, 12, 28, 10, 15)),
            customer_count: Some(2890),
            segments_count: Some(5),
            progress: None,
            error_message: None,
        },
        JobSummary {
            job_id: "job_007".to_string(),
            filename: "Takoradi_Customers.csv".to_string(),
            status: JobStatus::Completed,
            created_at: ts(2025, 12, 20, 14, 30),
            completed_at: Some(ts(2025, 12, 20, 14, 42)),
            customer_count: Some(567),
            segments_count: Some(4),
            progress: None,
            error_message: None,
        },
    ]
}

/// Filter and paginate a job record set.
///
/// Status filters are exact matches; search is a case-insensitive substring
/// match on the filename. The returned total is the filtered count BEFORE
/// pagination; callers must not infer it from the page length.
#[must_use]
pub fn list_jobs(jobs: Vec<JobSummary>, query: &HistoryQuery) -> (Vec<JobSummary>, u64) {
    let filtered: Vec<JobSummary> = jobs
        .into_iter()
        .filter(|job| query.status.is_none_or(|s| job.status == s))
        .filter(|job| {
            query.search.as_ref().is_none_or(|needle| {
                job.filename
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
        })
        .collect();

    let total = filtered.len() as u64;
    let page = query.page.max(1) as usize;
    let per_page = query.per_page.max(1) as usize;
    let offset = (page - 1) * per_page;

    let page_items = filtered
        .into_iter()
        .skip(offset)
        .take(per_page)
        .collect();
    (page_items, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u32, per_page: u32) -> HistoryQuery {
        HistoryQuery {
            page,
            per_page,
            status: None,
            search: None,
        }
    }

    #[test]
    fn fixture_set_has_seven_jobs_five_completed() {
        let jobs = demo_history();
        assert_eq!(jobs.len(), 7);
        let completed = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .count();
        assert_eq!(completed, 5);
        assert_eq!(jobs[1].filename, "Accra_Customer_Segment_v2.csv");
    }

    #[test]
    fn status_filter_returns_all_matches_with_exact_total() {
        let (jobs, total) = list_jobs(
            demo_history(),
            &HistoryQuery {
                status: Some(JobStatus::Completed),
                ..query(1, 5)
            },
        );
        assert_eq!(total, 5);
        assert_eq!(jobs.len(), 5);
        assert!(jobs.iter().all(|j| j.status == JobStatus::Completed));
    }

    #[test]
    fn total_reflects_the_filtered_count_not_the_page_size() {
        let (jobs, total) = list_jobs(demo_history(), &query(1, 3));
        assert_eq!(total, 7);
        assert_eq!(jobs.len(), 3);
    }

    #[test]
    fn pagination_offsets_by_page() {
        let (page1, _) = list_jobs(demo_history(), &query(1, 3));
        let (page2, _) = list_jobs(demo_history(), &query(2, 3));
        let (page3, _) = list_jobs(demo_history(), &query(3, 3));
        assert_eq!(page1.len(), 3);
        assert_eq!(page2.len(), 3);
        assert_eq!(page3.len(), 1);
        assert_ne!(page1[0].job_id, page2[0].job_id);
    }

    #[test]
    fn page_past_the_end_is_empty_with_unchanged_total() {
        let (jobs, total) = list_jobs(demo_history(), &query(9, 10));
        assert!(jobs.is_empty());
        assert_eq!(total, 7);
    }

    #[test]
    fn search_is_case_insensitive_substring_on_filename() {
        let (jobs, total) = list_jobs(
            demo_history(),
            &HistoryQuery {
                search: Some("aCCra".to_string()),
                ..query(1, 10)
            },
        );
        assert_eq!(total, 1);
        assert_eq!(jobs[0].job_id, "job_002");
    }

    #[test]
    fn combined_filters_compose() {
        let (jobs, total) = list_jobs(
            demo_history(),
            &HistoryQuery {
                status: Some(JobStatus::Completed),
                search: Some("sales".to_string()),
                ..query(1, 10)
            },
        );
        assert_eq!(total, 2);
        assert!(jobs
            .iter()
            .all(|j| j.filename.to_lowercase().contains("sales")));
    }
}
