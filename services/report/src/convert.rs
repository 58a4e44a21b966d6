//! Excel order export -> CSV snapshot
//!
//! Reads the first sheet of an `ALINAN SİPARİŞLER` workbook and writes it
//! row for row as the comma-separated snapshot read by the pipeline's CSV
//! fallback. Dates are written as `DD.MM.YYYY`.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use order_pipeline::values::ORDER_DATE_FORMAT;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker the export file name must contain.
pub const EXPORT_NAME_MARKER: &str = "ALINAN";

/// `.xlsx` containing `ALINAN`. Hidden files and Excel lock files (`~$...`)
/// never match.
pub fn is_export_name(name: &str) -> bool {
    !name.starts_with('.')
        && !name.starts_with("~$")
        && name.ends_with(".xlsx")
        && name.contains(EXPORT_NAME_MARKER)
}

pub fn is_export_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(is_export_name)
        .unwrap_or(false)
}

/// First export in `dir`, by name order.
pub fn find_export(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_export_path(path))
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Convert the first sheet of `input` into `output`. Returns rows written.
pub fn convert_to_csv(input: &Path, output: &Path) -> Result<usize> {
    info!("Reading Excel file: {}", input.display());

    // calamine auto-detects xls, xlsx, xlsb, ods
    let mut workbook = open_workbook_auto(input).context("Failed to open Excel file")?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names.first().context("Excel file has no sheets")?;
    let range = workbook
        .worksheet_range(sheet_name)
        .context("Failed to read sheet")?;

    let (row_count, col_count) = range.get_size();
    info!(
        "Sheet '{}' (first of {}): {} rows x {} columns",
        sheet_name,
        sheet_names.len(),
        row_count,
        col_count
    );

    let rows = sheet_rows(&range);
    write_csv(&rows, output)?;
    info!("CSV written: {} ({} rows)", output.display(), rows.len());
    Ok(rows.len())
}

pub fn sheet_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

pub fn write_csv(rows: &[Vec<String>], output: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Display text of a cell as the CSV reader expects it.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format(ORDER_DATE_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
