//! Analysis result types. Remote responses and locally synthesized demo
//! results share these exact shapes so downstream consumers are mode-agnostic.

use serde::{Deserialize, Serialize};

use crate::job::JobStatus;

/// Full results for a completed job. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub job_id: String,
    pub status: JobStatus,
    pub num_customers: u64,
    pub num_transactions: u64,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    /// Percentage of the customer base considered churn-risk.
    pub churn_rate: f64,
    pub date_range: DateRange,
    pub clustering_method: String,
    pub num_clusters: u32,
    pub silhouette_score: f64,
    pub segments: Vec<Segment>,
    pub recent_customers: Vec<RecentCustomer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// A named customer cluster with behavioral averages and recommended actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub cluster_id: u32,
    pub segment_label: String,
    pub num_customers: u64,
    /// Share of total customers, 0..=100; all segments sum to ~100.
    pub percentage: f64,
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub total_revenue: f64,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCustomer {
    pub name: String,
    pub email: String,
    pub segment: String,
    pub last_purchase: String,
    pub status: String,
    pub spend: f64,
}
