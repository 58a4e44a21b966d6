//! Schema Normalizer - maps upstream payloads onto `OrderRecord`
//!
//! Input may be a bare list of objects or an envelope object holding the
//! list under a conventional key. Column dialect is resolved once per payload
//! through `ColumnIndex`, then every row is canonicalized and filtered.

use crate::record::{derive_remaining_quantity, OrderRecord};
use crate::schema::{CanonicalField, ColumnIndex, Row};
use crate::values::{parse_date_with, round_to_integer, DateStrategy, LENIENT_DATE};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Keys under which the upstream wraps its record list.
pub const ENVELOPE_KEYS: &[&str] = &["data", "Data", "result", "Result", "results"];

/// Extract the record objects from a payload. Unknown shapes yield no rows.
pub fn unwrap_envelope(payload: Value) -> Vec<Map<String, Value>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            let key = ENVELOPE_KEYS
                .iter()
                .find(|key| matches!(envelope.get(**key), Some(Value::Array(_))));
            match key.and_then(|key| envelope.remove(*key)) {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!(
                        "Upstream object has no known envelope key ({:?}); treating as empty",
                        envelope.keys().collect::<Vec<_>>()
                    );
                    return Vec::new();
                }
            }
        }
        other => {
            warn!("Unexpected upstream payload shape: {}; treating as empty", kind(&other));
            return Vec::new();
        }
    };

    let total = items.len();
    let rows: Vec<Map<String, Value>> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if rows.len() < total {
        warn!("Skipped {} non-object entries in upstream list", total - rows.len());
    }
    rows
}

/// Unwrap, canonicalize and filter an upstream payload.
pub fn normalize_payload(payload: Value) -> Vec<OrderRecord> {
    normalize_rows(&unwrap_envelope(payload))
}

/// Canonicalize rows and drop undated non-summary rows.
///
/// If filtering would remove every row, the unfiltered set is returned so
/// the caller never gets an empty list when data existed.
pub fn normalize_rows(rows: &[Map<String, Value>]) -> Vec<OrderRecord> {
    if rows.is_empty() {
        return Vec::new();
    }

    let index = ColumnIndex::from_rows(rows);
    let all: Vec<OrderRecord> = rows
        .iter()
        .map(|cells| canonicalize(&Row::new(&index, cells), LENIENT_DATE))
        .collect();

    let kept: Vec<OrderRecord> = all.iter().filter(|r| r.is_keepable()).cloned().collect();
    debug!("Normalized {} rows, kept {}", all.len(), kept.len());

    if kept.is_empty() {
        warn!("Processed data is empty after normalization; returning unfiltered rows");
        return all;
    }
    kept
}

/// Build one canonical record from a row, deriving `date` and the remaining
/// quantity.
pub fn canonicalize(row: &Row<'_>, date_strategies: &[DateStrategy]) -> OrderRecord {
    let order_date_raw = row.text(CanonicalField::OrderDateRaw);
    let date = parse_date_with(&order_date_raw, date_strategies);

    let quantity = round_to_integer(row.number(CanonicalField::Quantity));
    let delivered_quantity = round_to_integer(row.number(CanonicalField::DeliveredQuantity));
    let remaining_quantity = derive_remaining_quantity(
        round_to_integer(row.number(CanonicalField::RemainingQuantity)),
        quantity,
        delivered_quantity,
    );

    OrderRecord {
        order_date_raw,
        date,
        customer_name: row.text(CanonicalField::CustomerName),
        cost_center_name: row.text(CanonicalField::CostCenterName),
        cost_center_code: row.text(CanonicalField::CostCenterCode),
        quantity,
        delivered_quantity,
        remaining_quantity,
        gross_amount: row.number(CanonicalField::GrossAmount),
        net_amount: row.number(CanonicalField::NetAmount),
        remaining_net_amount: row.number(CanonicalField::RemainingNetAmount),
        currency: row.text(CanonicalField::Currency),
        project: row.text(CanonicalField::Project),
        status: row.text(CanonicalField::Status),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
