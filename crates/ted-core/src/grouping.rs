//! Row keys for grouping and sorting.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ted_model::Entry;

/// Group key made of the parent variable and the given column cells.
pub fn row_key(row: &Entry, columns: &[&str]) -> Vec<String> {
    let mut key = Vec::with_capacity(columns.len() + 1);
    key.push(row.parent_variable.clone());
    key.extend(columns.iter().map(|id| row.cell(id)));
    key
}

/// Group key made of the parent variable and every field cell.
pub fn field_key(row: &Entry) -> (String, BTreeMap<String, String>) {
    (row.parent_variable.clone(), row.fields.clone())
}

/// Compares two cells numerically when both parse as numbers.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_sort_numerically() {
        assert_eq!(compare_cells("900", "1000"), Ordering::Less);
        assert_eq!(compare_cells("AT", "DE"), Ordering::Less);
        assert_eq!(compare_cells("2030", "*"), "2030".cmp("*"));
    }
}
