//! CSV helpers for the flow and technology type tables.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use ted_model::{Result, TedError};

pub type CsvRow = BTreeMap<String, String>;

/// Reads a CSV file into header-keyed rows.
///
/// Strips a UTF-8 BOM from the first header and trims every cell.
pub fn read_csv_rows(path: &Path) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| TedError::parse(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TedError::parse(path, e))?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').to_string())
        .collect();

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|e| TedError::parse(path, e))?;
            Ok(headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect())
        })
        .collect()
}

/// Reads rows keyed by the `id` column. Rows without an id are skipped.
pub fn read_keyed_rows(path: &Path) -> Result<BTreeMap<String, CsvRow>> {
    let mut keyed = BTreeMap::new();
    for row in read_csv_rows(path)? {
        if let Some(id) = optional(&row, "id") {
            keyed.insert(id, row);
        }
    }
    Ok(keyed)
}

/// Cell value, None if empty or missing.
pub fn optional(row: &CsvRow, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}
