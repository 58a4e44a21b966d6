//! The canonical, dashboard-facing order record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One order line in canonical shape. Every field is always present;
/// unresolved values default to empty string or zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Date exactly as received (e.g. `18.08.2025`)
    pub order_date_raw: String,
    /// ISO-8601 date derived from `order_date_raw`, `null` when unparseable
    pub date: Option<NaiveDate>,
    pub customer_name: String,
    pub cost_center_name: String,
    pub cost_center_code: String,
    pub quantity: i64,
    pub delivered_quantity: i64,
    /// Never negative
    pub remaining_quantity: i64,
    pub gross_amount: f64,
    pub net_amount: f64,
    pub remaining_net_amount: f64,
    pub currency: String,
    pub project: String,
    pub status: String,
}

impl OrderRecord {
    /// Rows without a date survive only as currency summary rows carrying a
    /// positive remaining amount.
    pub fn is_keepable(&self) -> bool {
        self.date.is_some() || (!self.currency.is_empty() && self.remaining_net_amount > 0.0)
    }
}

/// Explicit remaining quantity when positive, otherwise `quantity - delivered`
/// clamped at zero.
pub fn derive_remaining_quantity(explicit: i64, quantity: i64, delivered: i64) -> i64 {
    if explicit > 0 {
        explicit
    } else {
        (quantity - delivered).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_quantity_explicit_wins() {
        assert_eq!(derive_remaining_quantity(250, 1000, 400), 250);
    }

    #[test]
    fn test_remaining_quantity_derived_and_clamped() {
        assert_eq!(derive_remaining_quantity(0, 1000, 400), 600);
        assert_eq!(derive_remaining_quantity(0, 100, 150), 0);
        assert_eq!(derive_remaining_quantity(-5, 10, 20), 0);
        // no order activity stays zero
        assert_eq!(derive_remaining_quantity(0, 0, 0), 0);
    }

    #[test]
    fn test_keepable_rules() {
        let dated = OrderRecord {
            date: NaiveDate::from_ymd_opt(2025, 8, 18),
            ..Default::default()
        };
        assert!(dated.is_keepable());

        let summary = OrderRecord {
            currency: "TL".to_string(),
            remaining_net_amount: 1500.0,
            ..Default::default()
        };
        assert!(summary.is_keepable());

        let no_currency = OrderRecord {
            remaining_net_amount: 1500.0,
            ..Default::default()
        };
        assert!(!no_currency.is_keepable());

        let zero_amount = OrderRecord {
            currency: "TL".to_string(),
            ..Default::default()
        };
        assert!(!zero_amount.is_keepable());
    }

    #[test]
    fn test_serializes_iso_date_and_null() {
        let rec = OrderRecord {
            order_date_raw: "18.08.2025".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 18),
            ..Default::default()
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["date"], "2025-08-18");
        assert_eq!(json["cost_center_code"], "");

        let json = serde_json::to_value(OrderRecord::default()).unwrap();
        assert!(json["date"].is_null());
        assert_eq!(json["quantity"], 0);
    }
}
