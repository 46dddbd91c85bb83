//! Demo-mode job progression and result synthesis.
//!
//! Demo jobs have no stored transitions: status is derived from wall-clock
//! time elapsed since creation, and the result is fabricated deterministically
//! from the upload's sample rows so it has the exact shape the remote engine
//! would return.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::job::JobStatus;
use crate::mapping::ColumnMapping;
use crate::result::{AnalysisResult, DateRange, RecentCustomer, Segment};

/// A demo job stays `pending` for this many seconds after creation.
pub const PROCESSING_AFTER_SECS: i64 = 2;
/// A demo job completes once this many seconds have elapsed.
pub const COMPLETE_AFTER_SECS: i64 = 10;

/// Sample rows are treated as a 1% sample of the full dataset.
const DATASET_SCALE: u64 = 100;
/// Estimated distinct customers per transaction.
const CUSTOMERS_PER_TRANSACTION: f64 = 0.3;

struct Archetype {
    label: &'static str,
    /// Share of total customers, as displayed (sums to 100).
    percentage: f64,
    /// Customer count as a fraction of estimated transactions.
    customer_share: f64,
    revenue_share: f64,
    avg_recency: f64,
    avg_frequency: f64,
    avg_monetary: f64,
    actions: [&'static str; 3],
}

/// Fixed five-segment taxonomy applied to every demo result.
const ARCHETYPES: [Archetype; 5] = [
    Archetype {
        label: "Champions",
        percentage: 40.0,
        customer_share: 0.12,
        revenue_share: 0.40,
        avg_recency: 5.0,
        avg_frequency: 12.0,
        avg_monetary: 2500.0,
        actions: [
            "Offer exclusive loyalty rewards",
            "Early access to new products",
            "Personal thank-you messages",
        ],
    },
    Archetype {
        label: "Loyalists",
        percentage: 25.0,
        customer_share: 0.08,
        revenue_share: 0.25,
        avg_recency: 15.0,
        avg_frequency: 8.0,
        avg_monetary: 1200.0,
        actions: [
            "Upsell premium products",
            "Referral program incentives",
            "Birthday/anniversary offers",
        ],
    },
    Archetype {
        label: "Potential Loyalists",
        percentage: 15.0,
        customer_share: 0.05,
        revenue_share: 0.15,
        avg_recency: 20.0,
        avg_frequency: 4.0,
        avg_monetary: 800.0,
        actions: [
            "Membership program offers",
            "Product recommendations",
            "Engagement campaigns",
        ],
    },
    Archetype {
        label: "At Risk",
        percentage: 15.0,
        customer_share: 0.05,
        revenue_share: 0.10,
        avg_recency: 60.0,
        avg_frequency: 3.0,
        avg_monetary: 600.0,
        actions: [
            "Win-back email campaign",
            "Special discount offers",
            "Feedback survey",
        ],
    },
    Archetype {
        label: "Hibernating",
        percentage: 5.0,
        customer_share: 0.02,
        revenue_share: 0.05,
        avg_recency: 120.0,
        avg_frequency: 1.0,
        avg_monetary: 200.0,
        actions: [
            "Reactivation campaign",
            "Survey to understand needs",
            "Updated product showcase",
        ],
    },
];

/// Churn-risk share of the base: At Risk + Hibernating.
const CHURN_RATE: f64 = 20.0;

/// Derive a demo job's status and progress from elapsed wall-clock time.
///
/// Pure: status for a given `(created_at, now)` pair never changes, which is
/// what lets arbitrarily spaced polls agree. Progress is `elapsed * 10`
/// clamped to 0..=100; a job polled once after a long gap resolves straight
/// to `Completed`.
#[must_use]
pub fn status_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> (JobStatus, u8) {
    let elapsed = (now - created_at).num_seconds().max(0);
    let progress = u8::try_from((elapsed * 10).clamp(0, 100)).unwrap_or(100);
    let status = if elapsed > COMPLETE_AFTER_SECS {
        JobStatus::Completed
    } else if elapsed > PROCESSING_AFTER_SECS {
        JobStatus::Processing
    } else {
        JobStatus::Pending
    };
    (status, progress)
}

/// Parse a raw amount cell, tolerating thousands separators and common
/// currency symbols. Unparseable cells count as zero.
fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '₵' | '$' | '€' | '£'))
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Fabricate a complete analysis result from the current upload's sample rows
/// and the active column mapping.
///
/// Deterministic: no randomness beyond what the input data carries. The
/// output schema is identical to the remote engine's, so rendering code
/// cannot tell the modes apart.
#[must_use]
pub fn synthesize(
    job_id: &str,
    sample_rows: &[HashMap<String, String>],
    mapping: &ColumnMapping,
) -> AnalysisResult {
    let num_transactions = sample_rows.len() as u64 * DATASET_SCALE;

    let amount_col = mapping.amount.as_deref().unwrap_or("amount");
    let sample_revenue: f64 = sample_rows
        .iter()
        .filter_map(|row| row.get(amount_col))
        .map(|raw| parse_amount(raw))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let total_revenue = sample_revenue * DATASET_SCALE as f64;

    #[allow(clippy::cast_precision_loss)]
    let transactions_f = num_transactions as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_customers = (transactions_f * CUSTOMERS_PER_TRANSACTION).round() as u64;

    let segments = ARCHETYPES
        .iter()
        .enumerate()
        .map(|(i, archetype)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let num_customers = (transactions_f * archetype.customer_share).round() as u64;
            Segment {
                cluster_id: u32::try_from(i).unwrap_or(0),
                segment_label: archetype.label.to_string(),
                num_customers,
                percentage: archetype.percentage,
                avg_recency: archetype.avg_recency,
                avg_frequency: archetype.avg_frequency,
                avg_monetary: archetype.avg_monetary,
                total_revenue: total_revenue * archetype.revenue_share,
                recommended_actions: archetype
                    .actions
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            }
        })
        .collect();

    let avg_order_value = if num_transactions == 0 {
        0.0
    } else {
        total_revenue / transactions_f
    };

    AnalysisResult {
        job_id: job_id.to_string(),
        status: JobStatus::Completed,
        num_customers,
        num_transactions,
        total_revenue,
        avg_order_value,
        churn_rate: CHURN_RATE,
        date_range: DateRange {
            start: "2023-10-01".to_string(),
            end: "2023-12-31".to_string(),
        },
        clustering_method: "kmeans".to_string(),
        num_clusters: 5,
        silhouette_score: 0.68,
        segments,
        recent_customers: recent_customers(),
    }
}

/// Fixed recent-customer sample shown on the dashboard; capped well below the
/// ten-record display limit.
fn recent_customers() -> Vec<RecentCustomer> {
    let rows = [
        ("Abena Boakye", "abena@example.com", "Champion", "Oct 24, 2023", "Active", 2450.00),
        ("Kwesi Mensah", "kwesi.m@example.com", "Loyalist", "Oct 22, 2023", "Active", 850.00),
        ("Yaw Addo", "yaw.addo@example.com", "At Risk", "Aug 15, 2023", "Inactive", 1200.00),
        ("Esi Koomson", "esi.k@example.com", "Loyalist", "Oct 20, 2023", "Active", 560.00),
        ("Kofi Asante", "kofi.a@example.com", "Champion", "Oct 25, 2023", "Active", 3200.00),
        ("Akua Mensah", "akua.m@example.com", "Potential Loyalist", "Oct 18, 2023", "Active", 420.00),
    ];
    rows.into_iter()
        .map(|(name, email, segment, last_purchase, status, spend)| RecentCustomer {
            name: name.to_string(),
            email: email.to_string(),
            segment: segment.to_string(),
            last_purchase: last_purchase.to_string(),
            status: status.to_string(),
            spend,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn rows_with_amounts(amounts: &[&str]) -> Vec<HashMap<String, String>> {
        amounts
            .iter()
            .map(|a| {
                let mut row = HashMap::new();
                row.insert("Cust_Ref_ID".to_string(), "C001".to_string());
                row.insert("Total_GHS".to_string(), (*a).to_string());
                row
            })
            .collect()
    }

    fn ghs_mapping() -> ColumnMapping {
        ColumnMapping {
            customer_id: Some("Cust_Ref_ID".to_string()),
            invoice_date: Some("Transaction_Date".to_string()),
            invoice_id: Some("Inv_Num".to_string()),
            amount: Some("Total_GHS".to_string()),
            ..ColumnMapping::default()
        }
    }

    #[test]
    fn status_follows_the_demo_timeline() {
        let t0 = Utc::now();
        assert_eq!(status_at(t0, t0 + Duration::seconds(1)).0, JobStatus::Pending);
        let (status, progress) = status_at(t0, t0 + Duration::seconds(5));
        assert_eq!(status, JobStatus::Processing);
        assert_eq!(progress, 50);
        assert_eq!(
            status_at(t0, t0 + Duration::seconds(11)).0,
            JobStatus::Completed
        );
    }

    #[test]
    fn boundary_seconds_stay_on_the_earlier_phase() {
        let t0 = Utc::now();
        assert_eq!(status_at(t0, t0 + Duration::seconds(2)).0, JobStatus::Pending);
        assert_eq!(
            status_at(t0, t0 + Duration::seconds(10)).0,
            JobStatus::Processing
        );
    }

    #[test]
    fn a_poll_after_a_long_gap_resolves_to_completed() {
        let t0 = Utc::now();
        let (status, progress) = status_at(t0, t0 + Duration::minutes(30));
        assert_eq!(status, JobStatus::Completed);
        assert_eq!(progress, 100);
    }

    #[test]
    fn progress_is_monotone_and_clamped() {
        let t0 = Utc::now();
        let mut last = 0;
        for secs in 0..20 {
            let (_, progress) = status_at(t0, t0 + Duration::seconds(secs));
            assert!(progress >= last, "progress regressed at {secs}s");
            assert!(progress <= 100);
            last = progress;
        }
    }

    #[test]
    fn clock_skew_before_creation_reads_as_zero_elapsed() {
        let t0 = Utc::now();
        let (status, progress) = status_at(t0, t0 - Duration::seconds(30));
        assert_eq!(status, JobStatus::Pending);
        assert_eq!(progress, 0);
    }

    #[test]
    fn parse_amount_strips_separators_and_currency() {
        assert!((parse_amount("1,200.50") - 1200.50).abs() < f64::EPSILON);
        assert!((parse_amount("GH₵ 850") - 850.0).abs() < f64::EPSILON);
        assert!((parse_amount("$ 3,000") - 3000.0).abs() < f64::EPSILON);
        assert!((parse_amount("n/a")).abs() < f64::EPSILON);
    }

    #[test]
    fn synthesize_scales_sample_rows_to_dataset_estimates() {
        let rows = rows_with_amounts(&["1,200.50", "GH₵ 850", "450"]);
        let result = synthesize("demo_1", &rows, &ghs_mapping());
        assert_eq!(result.num_transactions, 300);
        assert_eq!(result.num_customers, 90);
        assert!((result.total_revenue - 250_050.0).abs() < 1e-6);
        assert!((result.avg_order_value - 250_050.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn synthesize_produces_five_segments_summing_to_one_hundred() {
        let rows = rows_with_amounts(&["100", "200", "300"]);
        let result = synthesize("demo_2", &rows, &ghs_mapping());
        assert_eq!(result.segments.len(), 5);
        let sum: f64 = result.segments.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 0.01, "percentages sum to {sum}");
        let labels: Vec<&str> = result
            .segments
            .iter()
            .map(|s| s.segment_label.as_str())
            .collect();
        assert_eq!(
            labels,
            [
                "Champions",
                "Loyalists",
                "Potential Loyalists",
                "At Risk",
                "Hibernating"
            ]
        );
    }

    #[test]
    fn synthesize_is_deterministic() {
        let rows = rows_with_amounts(&["10.5", "20"]);
        let mapping = ghs_mapping();
        assert_eq!(
            synthesize("demo_3", &rows, &mapping),
            synthesize("demo_3", &rows, &mapping)
        );
    }

    #[test]
    fn synthesize_handles_empty_sample_without_division_by_zero() {
        let result = synthesize("demo_4", &[], &ghs_mapping());
        assert_eq!(result.num_transactions, 0);
        assert!(result.avg_order_value.abs() < f64::EPSILON);
        assert_eq!(result.segments.len(), 5);
    }

    #[test]
    fn recent_customers_stay_under_display_cap() {
        let result = synthesize("demo_5", &rows_with_amounts(&["1"]), &ghs_mapping());
        assert!(result.recent_customers.len() <= 10);
    }
}
