//! Presentation table returned by select and aggregate.

use std::path::Path;

use polars::prelude::{Column, DataFrame};
use ted_model::values::format_number;
use ted_model::{Result, TedError};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_text(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => format_number(*value),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Ordered columns with one cell per column in every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl OutputTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Builds a DataFrame. Columns holding only numbers become Float64,
    /// every other column is a string column; missing cells are null.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let cells: Vec<&Cell> = self.rows.iter().map(|row| &row[index]).collect();
                let numeric = cells
                    .iter()
                    .all(|cell| matches!(cell, Cell::Missing | Cell::Number(_)));
                if numeric {
                    let values: Vec<Option<f64>> = cells.iter().map(|cell| cell.as_number()).collect();
                    Column::new(name.as_str().into(), values)
                } else {
                    let values: Vec<Option<String>> = cells
                        .iter()
                        .map(|cell| match cell {
                            Cell::Missing => None,
                            other => Some(other.as_text()),
                        })
                        .collect();
                    Column::new(name.as_str().into(), values)
                }
            })
            .collect();
        DataFrame::new(columns).map_err(|e| TedError::Frame {
            message: e.to_string(),
        })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let writer = csv::Writer::from_path(path).map_err(|e| TedError::parse(path, e))?;
        self.write_to(writer)
            .map_err(|e| TedError::parse(path, e))
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(csv::Writer::from_writer(&mut buffer))
            .map_err(|e| TedError::parse("<memory>", e))?;
        String::from_utf8(buffer).map_err(|e| TedError::parse("<memory>", e))
    }

    fn write_to<W: std::io::Write>(&self, mut writer: csv::Writer<W>) -> csv::Result<()> {
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::as_text))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutputTable {
        OutputTable::new(
            vec!["variable".to_string(), "value".to_string()],
            vec![
                vec![Cell::Text("Tech|X|CAPEX".to_string()), Cell::Number(1.5)],
                vec![Cell::Text("Tech|X|OPEX Fixed".to_string()), Cell::Missing],
            ],
        )
    }

    #[test]
    fn dataframe_types_follow_cells() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("value").unwrap().f64().unwrap().get(0), Some(1.5));
        assert_eq!(df.column("value").unwrap().null_count(), 1);
        assert_eq!(
            df.column("variable").unwrap().str().unwrap().get(1),
            Some("Tech|X|OPEX Fixed")
        );
    }

    #[test]
    fn csv_writes_missing_as_empty() {
        let csv = sample().to_csv_string().unwrap();
        assert_eq!(csv, "variable,value\nTech|X|CAPEX,1.5\nTech|X|OPEX Fixed,\n");
    }
}
