use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use ted_model::{Result, TedError};

/// Raw CSV content: normalized headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().to_string()
}

/// Reads a CSV file whose first row is the header.
///
/// Blank lines are skipped; short rows are padded with empty cells.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| TedError::parse(path, e))?;
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TedError::parse(path, e))?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        raw_rows.push(row);
    }
    let mut raw_rows = raw_rows.into_iter();
    let Some(header_row) = raw_rows.next() else {
        return Ok(CsvTable::default());
    };
    let headers: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();
    let rows = raw_rows
        .map(|record| {
            (0..headers.len())
                .map(|idx| record.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(CsvTable { headers, rows })
}

/// Writes headers and rows as a comma-delimited, double-quoted CSV file.
pub fn write_csv_table(path: &Path, table: &CsvTable) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| TedError::parse(path, e))?;
    writer
        .write_record(&table.headers)
        .map_err(|e| TedError::parse(path, e))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| TedError::parse(path, e))?;
    }
    writer.flush().map_err(|e| TedError::io(path, e))
}
