use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use ted_core::OutputTable;
use ted_ingest::ConsistencyIssue;
use ted_model::VariableSpec;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Renders a harmonized table. Numeric cells are right aligned.
pub fn output_table(output: &OutputTable) -> Table {
    let mut table = Table::new();
    table.set_header(output.columns.iter().map(|c| header_cell(c)));
    apply_table_style(&mut table);
    if let Some(index) = output.column_index("value") {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in &output.rows {
        table.add_row(row.iter().map(|cell| match cell {
            ted_core::Cell::Missing => dim_cell("-"),
            other => Cell::new(other.as_text()),
        }));
    }
    table
}

pub fn print_output(output: &OutputTable) {
    println!("{}", output_table(output));
    println!("{} rows", output.len());
}

pub fn print_issues(issues: &[ConsistencyIssue]) {
    if issues.is_empty() {
        println!("No issues found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Column"),
        header_cell("Issue"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in issues {
        table.add_row(vec![
            Cell::new(issue.row),
            Cell::new(&issue.column).fg(Color::Yellow),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
    println!("{} issues", issues.len());
}

pub fn print_variables(variables: &[&VariableSpec]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Unit"),
        header_cell("Reference"),
        header_cell("Flow"),
    ]);
    apply_table_style(&mut table);
    for spec in variables {
        table.add_row(vec![
            Cell::new(&spec.name),
            optional_cell(spec.default_unit.as_deref()),
            optional_cell(spec.default_reference.as_deref()),
            optional_cell(spec.flow_id.as_deref()),
        ]);
    }
    println!("{table}");
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
