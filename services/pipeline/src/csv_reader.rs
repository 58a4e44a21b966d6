//! CSV Reader - the local order snapshot exported from Excel
//!
//! Expected headers (Turkish export, aliases accepted):
//!   SİPARİŞ TARİHİ, CARİ İSMİ, Sorumluluk Merkezi Adı, MİKTAR,
//!   TAMAMLANAN MİKTAR, TUTAR, NET TUTAR, DOVİZ CİNSİ, KALAN MİKTAR,
//!   KALAN SİPARİŞ NET TUTAR
//!
//! Rows whose order date is not a strict `DD.MM.YYYY` are summary or footer
//! lines and are skipped. A missing file is fatal; a bad row is not.

use crate::error::CsvError;
use crate::normalize::canonicalize;
use crate::record::OrderRecord;
use crate::schema::{CanonicalField, ColumnIndex, Row};
use crate::values::STRICT_DATE;
use encoding_rs::{Encoding, WINDOWS_1254};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column chain for the remaining net amount; first non-blank cell wins.
const REMAINING_NET_CHAIN: &[CanonicalField] = &[
    CanonicalField::RemainingNetAmount,
    CanonicalField::NetAmount,
    CanonicalField::GrossAmount,
];

/// Read and parse the snapshot at `path`.
pub async fn read_all(path: &Path) -> Result<Vec<OrderRecord>, CsvError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CsvError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    let content = decode_snapshot(&bytes);
    let records = parse_orders(&content)?;
    info!("Loaded {} orders from {}", records.len(), path.display());
    Ok(records)
}

/// BOM-aware decoding. Without a BOM, invalid UTF-8 is read as Windows-1254
/// (Turkish Excel default).
pub fn decode_snapshot(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1254.decode(bytes);
            text
        }
    }
}

/// Parse snapshot content into canonical records.
/// DETERMINISTIC: same content = same output.
pub fn parse_orders(content: &str) -> Result<Vec<OrderRecord>, CsvError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let index = ColumnIndex::new(headers.iter().map(String::as_str));

    let mut records = Vec::new();
    let mut skipped = 0;

    for (line_idx, result) in reader.records().enumerate() {
        let line_num = line_idx + 2; // +1 for 0-index, +1 for header

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping CSV line {} due to error: {}", line_num, e);
                skipped += 1;
                continue;
            }
        };

        let mut cells = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            cells
                .entry(header.clone())
                .or_insert_with(|| Value::String(cell.to_string()));
        }
        let row = Row::new(&index, &cells);

        let mut order = canonicalize(&row, STRICT_DATE);
        if order.date.is_none() {
            debug!("Skipping CSV line {}: no order date ({:?})", line_num, order.order_date_raw);
            skipped += 1;
            continue;
        }

        order.remaining_net_amount = REMAINING_NET_CHAIN
            .iter()
            .find(|field| !row.is_blank(**field))
            .map(|field| row.number(*field))
            .unwrap_or(0.0);

        records.push(order);
    }

    if skipped > 0 {
        info!("Parsed {} CSV rows, skipped {}", records.len(), skipped);
    }
    Ok(records)
}
