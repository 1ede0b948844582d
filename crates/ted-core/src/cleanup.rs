//! Converts a working table into the presentation table.

use std::cmp::Ordering;

use ted_model::columns::{
    COL_PERIOD, COL_REFERENCE_VARIABLE, COL_REGION, COL_SOURCE, COL_UNIT, COL_VALUE, COL_VARIABLE,
};
use ted_model::values::round_to;
use ted_model::{Entry, Table};
use ted_units::combine_units;

use crate::grouping::compare_cells;
use crate::output::{Cell, OutputTable};

const VALUE_DIGITS: i32 = 4;

/// Column order: custom fields, `source`, `variable`, `reference_variable`,
/// `region`, `period`, `unit`, `value`. Variables are fully qualified and
/// rows are sorted by every non-value column.
pub fn cleanup(table: &Table) -> OutputTable {
    let mut columns: Vec<String> = table.schema.custom_fields().map(|f| f.id.clone()).collect();
    if table.schema.contains(COL_SOURCE) {
        columns.push(COL_SOURCE.to_string());
    }
    columns.extend(
        [COL_VARIABLE, COL_REFERENCE_VARIABLE, COL_REGION, COL_PERIOD, COL_UNIT, COL_VALUE]
            .map(str::to_string),
    );

    let mut rows: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .map(|row| columns.iter().map(|id| output_cell(row, id)).collect())
        .collect();
    rows.sort_by(|a, b| compare_rows(a, b));
    OutputTable::new(columns, rows)
}

fn output_cell(row: &Entry, id: &str) -> Cell {
    match id {
        COL_VARIABLE => Cell::Text(row.full_variable()),
        COL_REFERENCE_VARIABLE => row.full_reference().map_or(Cell::Missing, Cell::Text),
        COL_UNIT => output_unit(row).map_or(Cell::Missing, Cell::Text),
        COL_VALUE if row.has_value() => Cell::Number(round_to(row.value, VALUE_DIGITS)),
        COL_VALUE => Cell::Missing,
        other => Cell::Text(row.cell(other)),
    }
}

/// Unit per one reference unit, e.g. `EUR_2024/kW`.
fn output_unit(row: &Entry) -> Option<String> {
    match (row.unit.as_deref(), row.reference_unit.as_deref()) {
        (Some(unit), Some(reference)) => Some(combine_units(unit, reference)),
        (Some(unit), None) => Some(unit.to_string()),
        (None, _) => None,
    }
}

/// The value column is last and never takes part in the ordering.
fn compare_rows(a: &[Cell], b: &[Cell]) -> Ordering {
    let keys = a.len().saturating_sub(1);
    a[..keys]
        .iter()
        .zip(&b[..keys])
        .map(|(x, y)| compare_cells(&x.as_text(), &y.as_text()))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ted_model::TableSchema;

    use super::*;

    #[test]
    fn renders_full_paths_and_combined_unit() {
        let row = Entry::new("Tech|Electrolysis", "CAPEX", 1000.123456)
            .with_unit("EUR_2024")
            .with_reference("Output Capacity|Hydrogen", Some(1.0), "kW")
            .with_field("region", "DE")
            .with_field("period", "2030")
            .with_field("source", "Smith2023");
        let table = Table::new(Arc::new(TableSchema::base()), vec![row]);
        let output = cleanup(&table);
        assert_eq!(
            output.columns,
            vec!["source", "variable", "reference_variable", "region", "period", "unit", "value"]
        );
        assert_eq!(
            output.rows[0],
            vec![
                Cell::Text("Smith2023".to_string()),
                Cell::Text("Tech|Electrolysis|CAPEX".to_string()),
                Cell::Text("Tech|Electrolysis|Output Capacity|Hydrogen".to_string()),
                Cell::Text("DE".to_string()),
                Cell::Text("2030".to_string()),
                Cell::Text("EUR_2024/kW".to_string()),
                Cell::Number(1000.1235),
            ]
        );
    }

    #[test]
    fn periods_sort_numerically() {
        let rows = ["2100", "900"]
            .map(|p| Entry::new("X", "CAPEX", 1.0).with_field("period", p))
            .to_vec();
        let output = cleanup(&Table::new(Arc::new(TableSchema::base()), rows));
        let periods: Vec<String> = output
            .column("period")
            .unwrap()
            .iter()
            .map(|cell| cell.as_text())
            .collect();
        assert_eq!(periods, vec!["900", "2100"]);
    }
}
