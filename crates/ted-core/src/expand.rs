//! Field selection and wildcard expansion.
//!
//! A `*` cell stands for every value of the field's domain. Selecting a
//! field replicates wildcard rows once per requested value and keeps
//! concrete rows whose value was requested. Periods are additionally
//! interpolated between reported years.

use std::collections::{BTreeMap, BTreeSet};

use ted_model::columns::{COL_PERIOD, COL_VALUE};
use ted_model::values::format_number;
use ted_model::{
    Entry, FieldDefinition, FieldKind, FieldType, NOT_SPECIFIED, Result, Table, TedError, WILDCARD,
};
use tracing::{debug, warn};

use crate::grouping::row_key;

/// Value at period `p` from `(period, value)` points sorted by period.
///
/// Between two reported periods the value is
/// `v(lower) + (upper - p) / (upper - lower) * (v(upper) - v(lower))`.
/// Outside the reported range it is the nearest bound's value when
/// `extrapolate` is set, and None otherwise.
pub fn interpolate(points: &[(f64, f64)], p: f64, extrapolate: bool) -> Option<f64> {
    if let Some((_, value)) = points.iter().find(|(period, _)| *period == p) {
        return Some(*value);
    }
    let lower = points.iter().rev().find(|(period, _)| *period < p);
    let upper = points.iter().find(|(period, _)| *period > p);
    match (lower, upper) {
        (Some(&(lp, lv)), Some(&(up, uv))) => Some(lv + (up - p) / (up - lp) * (uv - lv)),
        (Some(&(_, value)), None) | (None, Some(&(_, value))) if extrapolate => Some(value),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldExpander<'a> {
    /// Parent variable, used in error messages.
    pub scope: &'a str,
    pub default_periods: &'a [i32],
}

impl<'a> FieldExpander<'a> {
    pub fn new(scope: &'a str, default_periods: &'a [i32]) -> Self {
        Self {
            scope,
            default_periods,
        }
    }

    /// Expands wildcards in `field_id` and keeps only requested values.
    ///
    /// `requested = None` selects the field's default values. `extrapolate`
    /// only affects the period field.
    pub fn select_and_expand(
        &self,
        table: Table,
        field_id: &str,
        requested: Option<&[String]>,
        extrapolate: bool,
    ) -> Result<Table> {
        let field = table
            .schema
            .field(field_id)
            .cloned()
            .ok_or_else(|| TedError::UnknownField {
                field: field_id.to_string(),
                variable: self.scope.to_string(),
            })?;

        let values = match requested {
            Some(values) => {
                validate_requested(&field, values)?;
                values.to_vec()
            }
            None => match self.default_values(&field, &table) {
                Some(values) => values,
                None => {
                    debug!(field = field_id, "no concrete values; passing through");
                    return Ok(table);
                }
            },
        };

        let before = table.len();
        let expanded = if field.kind == FieldKind::Period {
            expand_period(table, &values, extrapolate)
        } else {
            expand_values(table, &field, &values)
        };
        debug!(
            field = field_id,
            requested = values.len(),
            rows_before = before,
            rows_after = expanded.len(),
            "selected field"
        );
        Ok(expanded)
    }

    /// None means the field has no concrete values and passes through.
    fn default_values(&self, field: &FieldDefinition, table: &Table) -> Option<Vec<String>> {
        if field.kind == FieldKind::Period {
            return Some(
                self.default_periods
                    .iter()
                    .map(|p| format_number(f64::from(*p)))
                    .collect(),
            );
        }
        if let Some(codes) = &field.codes {
            let mut values: Vec<String> = codes.keys().cloned().collect();
            let has_unspecified = table
                .rows
                .iter()
                .any(|row| cell(row, field) == NOT_SPECIFIED);
            if field.field_type == FieldType::Component && has_unspecified {
                values.push(NOT_SPECIFIED.to_string());
            }
            return Some(values);
        }
        let present: BTreeSet<&str> = table
            .rows
            .iter()
            .map(|row| cell(row, field))
            .filter(|value| *value != WILDCARD)
            .collect();
        if present.is_empty() {
            None
        } else {
            Some(present.into_iter().map(str::to_string).collect())
        }
    }
}

fn validate_requested(field: &FieldDefinition, values: &[String]) -> Result<()> {
    for value in values {
        if value == WILDCARD || !field.is_allowed(value) {
            return Err(TedError::DisallowedValue {
                field: field.id.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

fn cell<'r>(row: &'r Entry, field: &FieldDefinition) -> &'r str {
    row.field(&field.id).unwrap_or_else(|| field.default_value())
}

fn expand_values(table: Table, field: &FieldDefinition, values: &[String]) -> Table {
    let requested: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let mut rows = Vec::with_capacity(table.len());
    for row in &table.rows {
        let current = cell(row, field);
        if current == WILDCARD {
            rows.extend(values.iter().map(|value| {
                let mut expanded = row.clone();
                expanded.set_field(&field.id, value.as_str());
                expanded
            }));
        } else if requested.contains(current) {
            rows.push(row.clone());
        }
    }
    table.with_rows(rows)
}

fn expand_period(table: Table, values: &[String], extrapolate: bool) -> Table {
    let periods: Vec<f64> = values.iter().filter_map(|v| v.trim().parse().ok()).collect();
    let key_columns: Vec<&str> = table
        .schema
        .column_ids()
        .filter(|id| *id != COL_PERIOD && *id != COL_VALUE)
        .collect();

    let mut rows = Vec::new();
    let mut groups: BTreeMap<Vec<String>, Vec<(f64, &Entry)>> = BTreeMap::new();
    for row in &table.rows {
        let period = row.period().unwrap_or(WILDCARD);
        if period == WILDCARD {
            rows.extend(periods.iter().map(|p| with_period(row, *p, row.value)));
            continue;
        }
        let Ok(period) = period.trim().parse::<f64>() else {
            continue;
        };
        groups
            .entry(row_key(row, &key_columns))
            .or_default()
            .push((period, row));
    }

    for mut reported in groups.into_values() {
        // Stable sort keeps same-period rows in input order.
        reported.sort_by(|a, b| a.0.total_cmp(&b.0));
        let points: Vec<(f64, f64)> = reported
            .iter()
            .map(|(period, row)| (*period, row.value))
            .collect();
        let duplicated = points.windows(2).any(|pair| pair[0].0 == pair[1].0);
        for p in &periods {
            let exact: Vec<&Entry> = reported
                .iter()
                .filter(|(period, _)| *period == *p)
                .map(|(_, row)| *row)
                .collect();
            if !exact.is_empty() {
                rows.extend(exact.into_iter().map(|row| with_period(row, *p, row.value)));
                continue;
            }
            if duplicated {
                warn!(
                    variable = %reported[0].1.full_variable(),
                    period = *p,
                    "rows report the same period more than once; interpolation skipped"
                );
                continue;
            }
            if let Some(value) = interpolate(&points, *p, extrapolate) {
                rows.push(with_period(reported[0].1, *p, value));
            }
        }
    }
    table.with_rows(rows)
}

fn with_period(row: &Entry, period: f64, value: f64) -> Entry {
    let mut expanded = row.clone();
    expanded.set_field(COL_PERIOD, format_number(period));
    expanded.value = value;
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_midpoint() {
        let points = [(2020.0, 100.0), (2040.0, 200.0)];
        assert_eq!(interpolate(&points, 2030.0, false), Some(150.0));
    }

    #[test]
    fn extrapolation_clamps_or_omits() {
        let points = [(2020.0, 100.0), (2040.0, 200.0)];
        assert_eq!(interpolate(&points, 2050.0, false), None);
        assert_eq!(interpolate(&points, 2050.0, true), Some(200.0));
        assert_eq!(interpolate(&points, 2010.0, true), Some(100.0));
    }

    #[test]
    fn exact_match_and_empty_group() {
        let points = [(2020.0, 100.0), (2040.0, 200.0)];
        assert_eq!(interpolate(&points, 2040.0, false), Some(200.0));
        assert_eq!(interpolate(&[], 2030.0, true), None);
    }

    #[test]
    fn weight_is_measured_from_upper_bound() {
        let points = [(2020.0, 100.0), (2040.0, 200.0)];
        assert_eq!(interpolate(&points, 2025.0, false), Some(175.0));
    }
}
