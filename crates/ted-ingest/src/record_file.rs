//! One raw TEDF file for one parent-variable scope.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use ted_database::Context;
use ted_model::columns::{
    COL_REFERENCE_UNIT, COL_REFERENCE_VALUE, COL_REFERENCE_VARIABLE, COL_UNCERTAINTY, COL_UNIT,
    COL_VALUE, COL_VARIABLE,
};
use ted_model::values::{non_empty, parse_optional_f64};
use ted_model::{ColumnKind, Entry, Result, Table, TableSchema, TedError};
use tracing::{debug, info};

use crate::csv_table::{CsvTable, read_csv_table, write_csv_table};

/// A row-level inconsistency found by [`RecordFile::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyIssue {
    /// Zero-based index into the file's rows.
    pub row: usize,
    pub column: String,
    pub message: String,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} [{}]: {}", self.row, self.column, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct RecordFile {
    pub parent_variable: String,
    pub schema: Arc<TableSchema>,
    pub rows: Vec<Entry>,
    pub path: Option<PathBuf>,
}

impl RecordFile {
    pub fn from_rows(
        parent_variable: impl Into<String>,
        schema: Arc<TableSchema>,
        rows: Vec<Entry>,
    ) -> Self {
        Self {
            parent_variable: parent_variable.into(),
            schema,
            rows,
            path: None,
        }
    }

    /// Reads a file against the merged schema of its scope.
    ///
    /// Unknown columns and unparseable numbers abort the read. Columns the
    /// file lacks are filled with their defaults.
    pub fn read(
        parent_variable: impl Into<String>,
        schema: Arc<TableSchema>,
        path: &Path,
    ) -> Result<Self> {
        let parent_variable = parent_variable.into();
        let table = read_csv_table(path)?;
        if let Some(unknown) = table.headers.iter().find(|h| !schema.contains(h)) {
            return Err(TedError::UnknownColumn {
                column: unknown.clone(),
                path: path.to_path_buf(),
            });
        }

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| parse_row(&parent_variable, &schema, &table, cells, path, idx + 1))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            path = %path.display(),
            parent_variable = %parent_variable,
            rows = rows.len(),
            "read record file"
        );
        Ok(Self {
            parent_variable,
            schema,
            rows,
            path: Some(path.to_path_buf()),
        })
    }

    /// Writes every schema column in canonical order.
    pub fn write(&self, path: &Path) -> Result<()> {
        let headers: Vec<String> = self.schema.column_ids().map(str::to_string).collect();
        let rows = self
            .rows
            .iter()
            .map(|entry| headers.iter().map(|id| entry.cell(id)).collect())
            .collect();
        write_csv_table(path, &CsvTable { headers, rows })?;
        info!(path = %path.display(), rows = self.rows.len(), "wrote record file");
        Ok(())
    }

    /// Row-level consistency checks. Never fails; issues are returned.
    pub fn check(&self, ctx: &Context) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        for (row, entry) in self.rows.iter().enumerate() {
            let mut issue = |column: &str, message: String| {
                issues.push(ConsistencyIssue {
                    row,
                    column: column.to_string(),
                    message,
                });
            };
            check_entry(ctx, &self.schema, entry, &mut issue);
        }
        debug!(
            parent_variable = %self.parent_variable,
            issues = issues.len(),
            "checked record file"
        );
        issues
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_table(self) -> Table {
        Table::new(self.schema, self.rows)
    }
}

fn parse_row(
    parent_variable: &str,
    schema: &TableSchema,
    table: &CsvTable,
    cells: &[String],
    path: &Path,
    row: usize,
) -> Result<Entry> {
    let cell = |id: &str| cell_at(table, cells, id);
    let number = |id: &str| -> Result<Option<f64>> {
        let raw = cell(id);
        parse_optional_f64(raw).map_err(|()| TedError::InvalidCell {
            path: path.to_path_buf(),
            row,
            column: id.to_string(),
            value: raw.to_string(),
        })
    };

    let mut entry = Entry::new(parent_variable, cell(COL_VARIABLE), f64::NAN);
    entry.reference_variable = non_empty(cell(COL_REFERENCE_VARIABLE));
    entry.value = number(COL_VALUE)?.unwrap_or(f64::NAN);
    entry.uncertainty = number(COL_UNCERTAINTY)?;
    entry.unit = non_empty(cell(COL_UNIT));
    entry.reference_value = number(COL_REFERENCE_VALUE)?;
    entry.reference_unit = non_empty(cell(COL_REFERENCE_UNIT));

    for column in schema.columns() {
        match &column.kind {
            ColumnKind::Field(field) => {
                let raw = cell(&field.id);
                let value = if raw.is_empty() {
                    field.default_value()
                } else {
                    raw
                };
                entry.set_field(&field.id, value);
            }
            ColumnKind::Comment => {
                let raw = cell(&column.id);
                if !raw.is_empty() {
                    entry.comments.insert(column.id.clone(), raw.to_string());
                }
            }
            ColumnKind::Variable | ColumnKind::Unit | ColumnKind::Value => {}
        }
    }
    Ok(entry)
}

fn cell_at<'a>(table: &CsvTable, cells: &'a [String], id: &str) -> &'a str {
    table
        .column_index(id)
        .and_then(|idx| cells.get(idx))
        .map_or("", String::as_str)
}

fn check_entry(
    ctx: &Context,
    schema: &TableSchema,
    entry: &Entry,
    issue: &mut impl FnMut(&str, String),
) {
    let registry = &ctx.registry;
    let variable = entry.full_variable();
    if !registry.contains(&variable) {
        issue(COL_VARIABLE, format!("unknown variable '{variable}'"));
    }
    let reference = entry.full_reference();
    if let Some(reference) = &reference
        && !registry.contains(reference)
    {
        issue(
            COL_REFERENCE_VARIABLE,
            format!("unknown reference variable '{reference}'"),
        );
    }

    if entry.has_value() && entry.unit.is_none() {
        issue(COL_UNIT, "value reported without a unit".to_string());
    }
    if reference.is_some() && entry.reference_unit.is_none() {
        issue(
            COL_REFERENCE_UNIT,
            "reference variable reported without a reference unit".to_string(),
        );
    }
    if reference.is_none() && (entry.reference_value.is_some() || entry.reference_unit.is_some()) {
        issue(
            COL_REFERENCE_VARIABLE,
            "reference value or unit reported without a reference variable".to_string(),
        );
    }

    for field in schema.fields() {
        let Some(value) = entry.field(&field.id) else {
            continue;
        };
        if !value.is_empty() && !field.is_allowed(value) {
            issue(
                &field.id,
                format!("value '{value}' is not allowed for field '{}'", field.id),
            );
        }
    }

    let mut check_unit = |column: &str, path: &str, unit: Option<&str>| {
        let (Some(unit), Some(target)) = (unit, registry.default_unit(path)) else {
            return;
        };
        if let Err(err) = ctx.converter.convert(Some(unit), Some(target), registry.flow_id(path)) {
            issue(column, format!("unit '{unit}' cannot be converted: {err}"));
        }
    };
    check_unit(COL_UNIT, &variable, entry.unit.as_deref());
    if let Some(reference) = &reference {
        check_unit(COL_REFERENCE_UNIT, reference, entry.reference_unit.as_deref());
    }
}
