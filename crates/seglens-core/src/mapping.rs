//! Column-mapping resolver: infers canonical field names from arbitrary
//! uploaded headers, and validates operator-submitted mappings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const CUSTOMER_ID: &str = "customer_id";
pub const INVOICE_DATE: &str = "invoice_date";
pub const INVOICE_ID: &str = "invoice_id";
pub const AMOUNT: &str = "amount";
pub const PRODUCT: &str = "product";
pub const CATEGORY: &str = "category";

/// Candidate name fragments per canonical field, in priority order. Fragment
/// priority outranks header order: the first fragment that matches any
/// still-unassigned header wins, even if a later header would have matched an
/// earlier fragment.
const FIELD_PATTERNS: [(&str, &[&str]); 6] = [
    (
        CUSTOMER_ID,
        &[
            "customer_id",
            "cust_id",
            "customerid",
            "customer",
            "cust_ref",
            "cust_ref_id",
            "client_id",
        ],
    ),
    (
        INVOICE_DATE,
        &[
            "date",
            "invoice_date",
            "transaction_date",
            "order_date",
            "purchase_date",
            "trans_date",
        ],
    ),
    (
        INVOICE_ID,
        &[
            "invoice_id",
            "inv_id",
            "invoice",
            "inv_num",
            "order_id",
            "transaction_id",
            "trans_id",
        ],
    ),
    (
        AMOUNT,
        &[
            "amount",
            "total",
            "total_amount",
            "total_ghs",
            "price",
            "value",
            "revenue",
            "sum",
        ],
    ),
    (PRODUCT, &["product", "item_name", "item", "sku"]),
    (CATEGORY, &["category", "product_type", "group"]),
];

/// Mapping from canonical field to a source header. `customer_id`,
/// `invoice_date`, `invoice_id`, and `amount` are required before a job may
/// be created; `product` and `category` are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ColumnMapping {
    fn field(&self, name: &str) -> Option<&String> {
        match name {
            CUSTOMER_ID => self.customer_id.as_ref(),
            INVOICE_DATE => self.invoice_date.as_ref(),
            INVOICE_ID => self.invoice_id.as_ref(),
            AMOUNT => self.amount.as_ref(),
            PRODUCT => self.product.as_ref(),
            CATEGORY => self.category.as_ref(),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            CUSTOMER_ID => Some(&mut self.customer_id),
            INVOICE_DATE => Some(&mut self.invoice_date),
            INVOICE_ID => Some(&mut self.invoice_id),
            AMOUNT => Some(&mut self.amount),
            PRODUCT => Some(&mut self.product),
            CATEGORY => Some(&mut self.category),
            _ => None,
        }
    }

    /// Validate completeness for job creation: every required field present
    /// and non-empty, and no source header assigned to two fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingMapping`] for the first absent required
    /// field, or [`CoreError::DuplicateMapping`] when two fields share a
    /// source header.
    pub fn validate(&self) -> Result<(), CoreError> {
        const REQUIRED: [&str; 4] = [CUSTOMER_ID, INVOICE_DATE, INVOICE_ID, AMOUNT];
        for name in REQUIRED {
            match self.field(name) {
                Some(header) if !header.trim().is_empty() => {}
                _ => return Err(CoreError::MissingMapping(field_name(name))),
            }
        }

        let assigned: Vec<(&'static str, &String)> = FIELD_PATTERNS
            .iter()
            .filter_map(|(name, _)| self.field(name).map(|h| (field_name(name), h)))
            .collect();
        for (i, (first, header)) in assigned.iter().enumerate() {
            for (second, other) in &assigned[i + 1..] {
                if header == other {
                    return Err(CoreError::DuplicateMapping {
                        header: (*header).clone(),
                        first,
                        second,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Static name for a canonical field, so errors can borrow it.
fn field_name(name: &str) -> &'static str {
    match name {
        CUSTOMER_ID => CUSTOMER_ID,
        INVOICE_DATE => INVOICE_DATE,
        INVOICE_ID => INVOICE_ID,
        AMOUNT => AMOUNT,
        PRODUCT => PRODUCT,
        _ => CATEGORY,
    }
}

/// Normalize a header or fragment for matching: drop spaces, hyphens, and
/// underscores, then lowercase.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Suggest a mapping for an uploaded header row.
///
/// Greedy and reproducible: identical input always yields an identical
/// mapping. Each header may be assigned to at most one field and vice versa;
/// fields with no matching header are left unset. Never errors.
#[must_use]
pub fn suggest(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let mut taken: Vec<bool> = vec![false; headers.len()];

    for (name, fragments) in FIELD_PATTERNS {
        'next_field: for fragment in fragments {
            let fragment = normalize(fragment);
            for (i, header) in headers.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                if normalize(header).contains(&fragment) {
                    taken[i] = true;
                    if let Some(slot) = mapping.field_mut(name) {
                        *slot = Some(header.clone());
                    }
                    break 'next_field;
                }
            }
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_ghanaian_retail_export_headers() {
        let cols = headers(&["Cust_Ref_ID", "Transaction_Date", "Inv_Num", "Total_GHS"]);
        let mapping = suggest(&cols);
        assert_eq!(mapping.customer_id.as_deref(), Some("Cust_Ref_ID"));
        assert_eq!(mapping.invoice_date.as_deref(), Some("Transaction_Date"));
        assert_eq!(mapping.invoice_id.as_deref(), Some("Inv_Num"));
        assert_eq!(mapping.amount.as_deref(), Some("Total_GHS"));
        assert!(mapping.product.is_none());
        assert!(mapping.category.is_none());
    }

    #[test]
    fn suggest_is_pure() {
        let cols = headers(&["Customer ID", "Order-Date", "Invoice", "Amount", "Product"]);
        let first = suggest(&cols);
        for _ in 0..5 {
            assert_eq!(suggest(&cols), first);
        }
    }

    #[test]
    fn fragment_priority_outranks_header_order() {
        // "some_customer" appears after "client_id" but matches the
        // higher-priority "customer" fragment, so it wins customer_id.
        let cols = headers(&["client_id", "some_customer"]);
        let mapping = suggest(&cols);
        assert_eq!(mapping.customer_id.as_deref(), Some("some_customer"));
    }

    #[test]
    fn each_header_assigned_at_most_once() {
        // Both headers match the "amount" fragment; only the first may be
        // assigned, and no other field picks up the leftover.
        let cols = headers(&["amount_paid", "amount_due"]);
        let mapping = suggest(&cols);
        assert_eq!(mapping.amount.as_deref(), Some("amount_paid"));
        assert!(mapping.customer_id.is_none());
        assert!(mapping.invoice_id.is_none());
    }

    #[test]
    fn unmatched_fields_stay_unset_without_error() {
        let mapping = suggest(&headers(&["colour", "weight"]));
        assert_eq!(mapping, ColumnMapping::default());
    }

    #[test]
    fn normalization_ignores_case_spaces_hyphens_underscores() {
        let cols = headers(&["CUSTOMER-ID", "Purchase Date", "inv num", "unit PRICE"]);
        let mapping = suggest(&cols);
        assert_eq!(mapping.customer_id.as_deref(), Some("CUSTOMER-ID"));
        assert_eq!(mapping.invoice_date.as_deref(), Some("Purchase Date"));
        assert_eq!(mapping.invoice_id.as_deref(), Some("inv num"));
        assert_eq!(mapping.amount.as_deref(), Some("unit PRICE"));
    }

    #[test]
    fn validate_accepts_complete_mapping() {
        let mapping = ColumnMapping {
            customer_id: Some("cust".into()),
            invoice_date: Some("date".into()),
            invoice_id: Some("inv".into()),
            amount: Some("total".into()),
            product: None,
            category: None,
        };
        mapping.validate().expect("complete mapping should validate");
    }

    #[test]
    fn validate_rejects_missing_required_field() {
        let mapping = ColumnMapping {
            customer_id: Some("cust".into()),
            invoice_date: Some("date".into()),
            invoice_id: None,
            amount: Some("total".into()),
            ..ColumnMapping::default()
        };
        let err = mapping.validate().expect_err("must reject");
        assert!(matches!(err, CoreError::MissingMapping("invoice_id")));
    }

    #[test]
    fn validate_rejects_blank_required_field() {
        let mapping = ColumnMapping {
            customer_id: Some("cust".into()),
            invoice_date: Some("  ".into()),
            invoice_id: Some("inv".into()),
            amount: Some("total".into()),
            ..ColumnMapping::default()
        };
        assert!(matches!(
            mapping.validate(),
            Err(CoreError::MissingMapping("invoice_date"))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_header_assignment() {
        let mapping = ColumnMapping {
            customer_id: Some("ref".into()),
            invoice_date: Some("date".into()),
            invoice_id: Some("ref".into()),
            amount: Some("total".into()),
            ..ColumnMapping::default()
        };
        let err = mapping.validate().expect_err("must reject duplicate");
        assert!(
            matches!(
                err,
                CoreError::DuplicateMapping { ref header, first: "customer_id", second: "invoice_id" }
                    if header == "ref"
            ),
            "got: {err:?}"
        );
    }

    #[test]
    fn duplicate_check_covers_optional_fields_too() {
        let mapping = ColumnMapping {
            customer_id: Some("cust".into()),
            invoice_date: Some("date".into()),
            invoice_id: Some("inv".into()),
            amount: Some("total".into()),
            product: Some("total".into()),
            category: None,
        };
        assert!(matches!(
            mapping.validate(),
            Err(CoreError::DuplicateMapping { .. })
        ));
    }
}
