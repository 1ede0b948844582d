//! Weighted aggregation over component and case fields.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ted_model::columns::{COL_SOURCE, COL_VALUE};
use ted_model::{Entry, FieldType, Result, Table, TableSchema, TedError, WILDCARD};
use tracing::{debug, info};

use crate::grouping::row_key;
use crate::masking::MaskEngine;

/// Aggregation fields: explicit ones must exist, the default is every
/// component custom field plus `source`.
pub fn resolve_agg_fields(
    schema: &TableSchema,
    requested: Option<&[String]>,
    scope: &str,
) -> Result<Vec<String>> {
    match requested {
        Some(fields) => {
            if let Some(unknown) = fields.iter().find(|id| schema.field(id).is_none()) {
                return Err(TedError::UnknownField {
                    field: unknown.clone(),
                    variable: scope.to_string(),
                });
            }
            Ok(fields.to_vec())
        }
        None => Ok(schema
            .fields()
            .filter(|field| {
                (field.is_custom() && field.field_type == FieldType::Component)
                    || field.id == COL_SOURCE
            })
            .map(|field| field.id.clone())
            .collect()),
    }
}

/// Collapses `agg_fields` into one row per group.
///
/// Within a group, component values are summed per combination of case
/// values, and those sums are averaged with the mean mask weight of their
/// rows. Rows with NaN weight are excluded. Groups whose weights sum to
/// zero produce no row.
pub fn aggregate(table: &Table, agg_fields: &[String], masks: &MaskEngine) -> Table {
    let weights = masks.weights(&table.rows);
    let agg: Vec<&str> = agg_fields.iter().map(String::as_str).collect();
    let case_fields: Vec<&str> = agg
        .iter()
        .copied()
        .filter(|id| {
            table
                .schema
                .field(id)
                .is_some_and(|field| field.field_type == FieldType::Case)
        })
        .collect();
    let key_columns: Vec<&str> = table
        .schema
        .column_ids()
        .filter(|id| *id != COL_VALUE && !agg.contains(id))
        .collect();

    let mut groups: BTreeMap<Vec<String>, Vec<(&Entry, f64)>> = BTreeMap::new();
    let mut excluded = 0usize;
    for (row, weight) in table.rows.iter().zip(weights) {
        if weight.is_nan() {
            excluded += 1;
            continue;
        }
        groups
            .entry(row_key(row, &key_columns))
            .or_default()
            .push((row, weight));
    }

    let mut rows = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let Some(value) = weighted_value(members, &case_fields) else {
            debug!(rows = members.len(), "group weights sum to zero; dropped");
            continue;
        };
        let mut row = members[0].0.clone();
        for id in &agg {
            row.fields.remove(*id);
        }
        row.value = value;
        rows.push(row);
    }

    let schema = Arc::new(table.schema.without_columns(&agg));
    let mut aggregated = Table::new(schema, rows);
    let placeholders = add_reference_placeholders(&mut aggregated);
    info!(
        rows_in = table.rows.len(),
        excluded,
        rows_out = aggregated.len(),
        placeholders,
        "aggregated table"
    );
    aggregated
}

fn weighted_value(members: &[(&Entry, f64)], case_fields: &[&str]) -> Option<f64> {
    let mut subgroups: BTreeMap<Vec<String>, (f64, f64, usize)> = BTreeMap::new();
    for (row, weight) in members {
        let key = case_fields.iter().map(|id| row.cell(id)).collect();
        let (sum, weights, count) = subgroups.entry(key).or_insert((0.0, 0.0, 0));
        *sum += row.value;
        *weights += weight;
        *count += 1;
    }

    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (sum, weights, count) in subgroups.into_values() {
        let weight = weights / count as f64;
        numerator += weight * sum;
        denominator += weight;
    }
    (denominator != 0.0).then(|| numerator / denominator)
}

/// Adds a `value = 1` row for every reference variable that never appears
/// as a variable, with every field set to `*`. Returns the number added.
fn add_reference_placeholders(table: &mut Table) -> usize {
    let variables: BTreeSet<(String, String)> = table
        .rows
        .iter()
        .map(|row| (row.parent_variable.clone(), row.variable.clone()))
        .collect();
    let mut missing: BTreeMap<(String, String), Option<String>> = BTreeMap::new();
    for row in &table.rows {
        let Some(reference) = &row.reference_variable else {
            continue;
        };
        let key = (row.parent_variable.clone(), reference.clone());
        if !variables.contains(&key) {
            missing
                .entry(key)
                .or_insert_with(|| row.reference_unit.clone());
        }
    }

    let field_ids: Vec<String> = table.schema.fields().map(|f| f.id.clone()).collect();
    let count = missing.len();
    for ((parent, reference), unit) in missing {
        let mut row = Entry::new(parent, reference, 1.0);
        row.unit = unit;
        for id in &field_ids {
            row.set_field(id, WILDCARD);
        }
        table.rows.push(row);
    }
    count
}

#[cfg(test)]
mod tests {
    use ted_model::FieldDefinition;

    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new(
            vec![FieldDefinition::custom("component", "Component", FieldType::Component, None)],
            Vec::new(),
        )
    }

    #[test]
    fn default_fields_are_components_and_source() {
        let fields = resolve_agg_fields(&schema(), None, "Tech|X").unwrap();
        assert_eq!(fields, vec!["component".to_string(), "source".to_string()]);
    }

    #[test]
    fn explicit_unknown_field_is_rejected() {
        let requested = vec!["colour".to_string()];
        let err = resolve_agg_fields(&schema(), Some(&requested), "Tech|X").unwrap_err();
        assert!(matches!(err, TedError::UnknownField { .. }));
    }

    #[test]
    fn zero_weight_sum_drops_group() {
        let members = [(&Entry::new("X", "CAPEX", 5.0), 0.0)];
        assert_eq!(weighted_value(&members, &[]), None);
    }
}
