//! Unit and reference normalization.
//!
//! Order per row:
//! 1. convert `reference_value` into the reference variable's target unit,
//! 2. divide `value` and `uncertainty` by `reference_value`, which becomes 1
//!    when it was reported,
//! 3. convert `value` and `uncertainty` into the variable's target unit.
//!
//! Step 1 must precede step 2: the factor applies to the reported
//! reference unit.

use std::time::Instant;

use ted_database::Context;
use ted_model::{Entry, Table};
use ted_units::UnitPair;
use tracing::{debug, warn};

use crate::options::UnitOverrides;
use crate::units::UnitTargets;

/// Normalizes every row to per-one-reference values in target units.
///
/// Unresolvable conversions make the row value NaN. Normalizing a
/// normalized table changes nothing.
pub fn normalize(table: Table, ctx: &Context, overrides: &UnitOverrides) -> Table {
    let start = Instant::now();
    let targets = UnitTargets::new(ctx, overrides);
    let mut rows = table.rows;

    normalize_reference_side(&mut rows, targets);
    normalize_reported_side(&mut rows, targets);

    let failed = rows.iter().filter(|row| !row.has_value()).count();
    debug!(
        rows = rows.len(),
        missing_values = failed,
        duration_ms = start.elapsed().as_millis(),
        "normalized table"
    );
    Table::new(table.schema, rows)
}

fn normalize_reference_side(rows: &mut [Entry], targets: UnitTargets<'_>) {
    let paths: Vec<Option<String>> = rows.iter().map(Entry::full_reference).collect();
    let pairs: Vec<UnitPair> = rows
        .iter()
        .zip(&paths)
        .map(|(row, path)| match path {
            Some(path) => UnitPair::new(
                row.reference_unit.as_deref(),
                targets.unit(path),
                targets.flow(path),
            ),
            None => UnitPair::new(None, None, None),
        })
        .collect();
    let factors = targets.ctx().converter.convert_rows(&pairs);

    for ((row, path), factor) in rows.iter_mut().zip(&paths).zip(factors) {
        let Some(path) = path else {
            continue;
        };
        let target = targets.unit(path);
        let factor = resolve_factor(row.reference_unit.as_deref(), target, factor, path);
        let reference_value = row.reference_value.unwrap_or(1.0) * factor;
        if let Some(target) = target {
            row.reference_unit = Some(target.to_string());
        }
        divide_by_reference(row, reference_value, path);
    }
}

fn normalize_reported_side(rows: &mut [Entry], targets: UnitTargets<'_>) {
    let paths: Vec<String> = rows.iter().map(Entry::full_variable).collect();
    let pairs: Vec<UnitPair> = rows
        .iter()
        .zip(&paths)
        .map(|(row, path)| {
            if row.has_value() {
                UnitPair::new(row.unit.as_deref(), targets.unit(path), targets.flow(path))
            } else {
                UnitPair::new(None, None, None)
            }
        })
        .collect();
    let factors = targets.ctx().converter.convert_rows(&pairs);

    for ((row, path), factor) in rows.iter_mut().zip(&paths).zip(factors) {
        let target = targets.unit(path);
        let factor = if row.has_value() {
            resolve_factor(row.unit.as_deref(), target, factor, path)
        } else {
            1.0
        };
        row.value *= factor;
        row.uncertainty = row.uncertainty.map(|u| u * factor);
        if let Some(target) = target {
            row.unit = Some(target.to_string());
        }
    }
}

/// Applies the missing-unit policy to a looked-up factor.
///
/// No target unit leaves the value as reported. A target without a
/// reported unit cannot be converted.
fn resolve_factor(from: Option<&str>, target: Option<&str>, factor: f64, variable: &str) -> f64 {
    match (from, target) {
        (_, None) => 1.0,
        (None, Some(target)) => {
            warn!(variable, target, "no unit reported; value set to NaN");
            f64::NAN
        }
        (Some(_), Some(_)) => factor,
    }
}

fn divide_by_reference(row: &mut Entry, reference_value: f64, reference: &str) {
    if reference_value == 0.0 {
        warn!(
            variable = %row.full_variable(),
            reference,
            "reference value is zero; value set to NaN"
        );
    }
    if reference_value == 0.0 || reference_value.is_nan() {
        row.value = f64::NAN;
        row.uncertainty = row.uncertainty.map(|_| f64::NAN);
    } else {
        row.value /= reference_value;
        row.uncertainty = row.uncertainty.map(|u| u / reference_value);
    }
    if row.reference_value.is_some() {
        row.reference_value = Some(1.0);
    }
}
