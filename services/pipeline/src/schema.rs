//! Canonical schema and the upstream column alias table
//!
//! Column names are compared in normalized form only: diacritics folded to
//! ASCII, lowercased, everything but `[a-z0-9]` removed. `SİPARİŞ TARİHİ`,
//! `sip_tarih` and `SipTarih` therefore compare as `siparistarihi`,
//! `siptarih` and `siptarih`.

use crate::values::parse_number;
use serde_json::{Map, Value};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    OrderDateRaw,
    CustomerName,
    CostCenterName,
    CostCenterCode,
    Quantity,
    DeliveredQuantity,
    RemainingQuantity,
    GrossAmount,
    NetAmount,
    RemainingNetAmount,
    Currency,
    Project,
    Status,
}

impl CanonicalField {
    /// Field name in the canonical record (and its JSON form).
    pub fn name(self) -> &'static str {
        match self {
            Self::OrderDateRaw => "order_date_raw",
            Self::CustomerName => "customer_name",
            Self::CostCenterName => "cost_center_name",
            Self::CostCenterCode => "cost_center_code",
            Self::Quantity => "quantity",
            Self::DeliveredQuantity => "delivered_quantity",
            Self::RemainingQuantity => "remaining_quantity",
            Self::GrossAmount => "gross_amount",
            Self::NetAmount => "net_amount",
            Self::RemainingNetAmount => "remaining_net_amount",
            Self::Currency => "currency",
            Self::Project => "project",
            Self::Status => "status",
        }
    }

    /// Normalized alias candidates, most specific first.
    pub fn aliases(self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

/// Canonical field -> normalized upstream aliases.
///
/// Covers the upstream's primary dialect (`sip_*`, `cari_unvan`, ...), the
/// alternate short dialect (`srmad`, `kalanmik`, ...) and the Turkish headers
/// of the Excel export.
pub const FIELD_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::OrderDateRaw,
        &["tarih", "siptarih", "siparistarihi", "siparistarih", "siptar"],
    ),
    (
        CanonicalField::CustomerName,
        &["cari", "cariunvan", "cariismi", "cariisim", "cariadi", "cariad"],
    ),
    (
        CanonicalField::CostCenterName,
        &["srmad", "sormerkadi", "sorumlulukmerkeziadi", "sorumlulukmerkezi"],
    ),
    (
        CanonicalField::CostCenterCode,
        &["srmkod", "sormerkkod", "sorumlulukmerkezikodu", "sipstoksormerk", "sormerk"],
    ),
    (
        CanonicalField::Quantity,
        &["miktar", "sipmiktar", "adet", "quantity"],
    ),
    (
        CanonicalField::DeliveredQuantity,
        &["teslim", "sipteslimmiktar", "teslimmiktar", "tamamlananmiktar", "delivered"],
    ),
    (
        CanonicalField::RemainingQuantity,
        &["kalanmik", "kalanmiktar", "kalansiparis", "remaining"],
    ),
    (
        CanonicalField::GrossAmount,
        &["tutar", "siptutar", "bruttutar", "gross"],
    ),
    (
        CanonicalField::NetAmount,
        &["nettutar", "sipnettutar"],
    ),
    (
        CanonicalField::RemainingNetAmount,
        &["kalannet", "kalansiparisnettutar", "kalantutar", "sipnettutar", "nettutar"],
    ),
    (
        CanonicalField::Currency,
        &["doviz", "sipcins", "dovizcinsi", "currency"],
    ),
    (
        CanonicalField::Project,
        &["proje", "project", "projeadi"],
    ),
    (
        CanonicalField::Status,
        &["durum", "status", "siparisdurum"],
    ),
];

/// Fold to ASCII, lowercase, keep only `[a-z0-9]`.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        // dotless i has no decomposition
        .map(|c| if c == 'ı' { 'i' } else { c })
        .nfkd()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalized column name -> original column name, built once per data set.
#[derive(Debug, Default, Clone)]
pub struct ColumnIndex {
    columns: HashMap<String, String>,
}

impl ColumnIndex {
    /// The first column producing a given normalized key wins.
    pub fn new<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = HashMap::new();
        for column in columns {
            index
                .entry(normalize_key(column))
                .or_insert_with(|| column.to_string());
        }
        Self { columns: index }
    }

    /// Union of the keys of every row, in first-seen order.
    pub fn from_rows(rows: &[Map<String, Value>]) -> Self {
        Self::new(rows.iter().flat_map(|row| row.keys().map(String::as_str)))
    }

    /// Original column backing `field`: first matching alias, else the
    /// canonical name itself.
    pub fn resolve(&self, field: CanonicalField) -> Option<&str> {
        field
            .aliases()
            .iter()
            .find_map(|alias| self.columns.get(*alias))
            .or_else(|| self.columns.get(&normalize_key(field.name())))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Field-level view of one input row through a `ColumnIndex`.
pub struct Row<'a> {
    index: &'a ColumnIndex,
    cells: &'a Map<String, Value>,
}

impl<'a> Row<'a> {
    pub fn new(index: &'a ColumnIndex, cells: &'a Map<String, Value>) -> Self {
        Self { index, cells }
    }

    pub fn value(&self, field: CanonicalField) -> Option<&'a Value> {
        let column = self.index.resolve(field)?;
        self.cells.get(column)
    }

    /// Trimmed text; `null`, booleans and missing cells are blank.
    pub fn text(&self, field: CanonicalField) -> String {
        match self.value(field) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    pub fn is_blank(&self, field: CanonicalField) -> bool {
        self.text(field).is_empty()
    }

    pub fn number(&self, field: CanonicalField) -> f64 {
        match self.value(field) {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
            Some(Value::String(s)) => parse_number(s),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    // -------------------------------------------------------------------------
    // KEY NORMALIZATION
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_key_turkish_headers() {
        assert_eq!(normalize_key("SİPARİŞ TARİHİ"), "siparistarihi");
        assert_eq!(normalize_key("CARİ İSMİ"), "cariismi");
        assert_eq!(normalize_key("Sorumluluk Merkezi Adı"), "sorumlulukmerkeziadi");
        assert_eq!(normalize_key("DOVİZ CİNSİ"), "dovizcinsi");
        assert_eq!(normalize_key("KALAN SİPARİŞ NET TUTAR"), "kalansiparisnettutar");
    }

    #[test]
    fn test_normalize_key_punctuation_and_case() {
        assert_eq!(normalize_key("sip_tarih"), "siptarih");
        assert_eq!(normalize_key("Sip-Tarih "), "siptarih");
        assert_eq!(normalize_key("remaining_net_amount"), "remainingnetamount");
    }

    #[test]
    fn test_alias_table_is_normalized_and_complete() {
        for (field, aliases) in FIELD_ALIASES {
            for alias in *aliases {
                assert_eq!(normalize_key(alias), *alias, "{:?}", field);
            }
        }
        assert_eq!(FIELD_ALIASES.len(), 13);
    }

    // -------------------------------------------------------------------------
    // RESOLUTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolve_primary_dialect() {
        let index = ColumnIndex::new(["sip_tarih", "cari_unvan", "sip_miktar", "sip_teslim_miktar"]);
        assert_eq!(index.resolve(CanonicalField::OrderDateRaw), Some("sip_tarih"));
        assert_eq!(index.resolve(CanonicalField::CustomerName), Some("cari_unvan"));
        assert_eq!(index.resolve(CanonicalField::Quantity), Some("sip_miktar"));
        assert_eq!(index.resolve(CanonicalField::DeliveredQuantity), Some("sip_teslim_miktar"));
        assert_eq!(index.resolve(CanonicalField::Currency), None);
    }

    #[test]
    fn test_resolve_alternate_dialect() {
        let index = ColumnIndex::new(["TARIH", "CARI", "SRMAD", "SRMKOD", "KALANMIK", "KALANNET"]);
        assert_eq!(index.resolve(CanonicalField::OrderDateRaw), Some("TARIH"));
        assert_eq!(index.resolve(CanonicalField::CostCenterName), Some("SRMAD"));
        assert_eq!(index.resolve(CanonicalField::CostCenterCode), Some("SRMKOD"));
        assert_eq!(index.resolve(CanonicalField::RemainingQuantity), Some("KALANMIK"));
        assert_eq!(index.resolve(CanonicalField::RemainingNetAmount), Some("KALANNET"));
    }

    #[test]
    fn test_resolve_most_specific_first() {
        let index = ColumnIndex::new(["sip_net_tutar", "kalan_siparis_net_tutar"]);
        assert_eq!(
            index.resolve(CanonicalField::RemainingNetAmount),
            Some("kalan_siparis_net_tutar")
        );
        assert_eq!(index.resolve(CanonicalField::NetAmount), Some("sip_net_tutar"));
    }

    #[test]
    fn test_resolve_falls_back_to_canonical_name() {
        let index = ColumnIndex::new(["order_date_raw", "delivered_quantity", "gross_amount"]);
        assert_eq!(index.resolve(CanonicalField::OrderDateRaw), Some("order_date_raw"));
        assert_eq!(index.resolve(CanonicalField::DeliveredQuantity), Some("delivered_quantity"));
        assert_eq!(index.resolve(CanonicalField::GrossAmount), Some("gross_amount"));
    }

    // -------------------------------------------------------------------------
    // ROW ACCESS
    // -------------------------------------------------------------------------

    #[test]
    fn test_row_text_and_number() {
        let cells = object(json!({
            "cari_unvan": "  ACME  ",
            "sip_miktar": "1,000",
            "sip_tutar": 2500.5,
            "sip_cins": null
        }));
        let index = ColumnIndex::new(cells.keys().map(String::as_str));
        let row = Row::new(&index, &cells);

        assert_eq!(row.text(CanonicalField::CustomerName), "ACME");
        assert_eq!(row.number(CanonicalField::Quantity), 1000.0);
        assert_eq!(row.number(CanonicalField::GrossAmount), 2500.5);
        assert!(row.is_blank(CanonicalField::Currency));
        assert!(row.is_blank(CanonicalField::Project));
        assert_eq!(row.number(CanonicalField::NetAmount), 0.0);
    }
}
