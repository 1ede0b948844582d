//! Derived-variable mappings applied before aggregation.
//!
//! Rows are grouped by parent variable and field cells. Each step only
//! looks at rows of the same group, and no row matches a step's trigger
//! after the step has run.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use ted_database::Context;
use ted_model::{Entry, Table, join_path};
use tracing::{debug, warn};

use crate::grouping::field_key;
use crate::options::UnitOverrides;
use crate::units::UnitTargets;

const FLH: &str = "FLH";
const OCF: &str = "OCF";
const CAPEX: &str = "CAPEX";
const OPEX_FIXED: &str = "OPEX Fixed";
const OPEX_FIXED_RELATIVE: &str = "OPEX Fixed Relative";
const OPEX_FIXED_SPECIFIC: &str = "OPEX Fixed Specific";
const DIMENSIONLESS: &str = "dimensionless";
const YEAR: &str = "a";

static OUTPUT_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Output( Capacity)?\|").expect("Invalid output regex"));

static INPUT_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Input( Capacity)?\|").expect("Invalid input regex"));

static FLOW_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Input|Output)( Capacity)?\|").expect("Invalid flow reference regex")
});

/// Runs every mapping step over each group of the table.
pub fn apply_mappings(table: Table, ctx: &Context, overrides: &UnitOverrides) -> Table {
    let Table { schema, rows } = table;
    let before = rows.len();
    let mapper = Mapper {
        targets: UnitTargets::new(ctx, overrides),
    };

    let mut groups: BTreeMap<_, Vec<Entry>> = BTreeMap::new();
    for row in rows {
        groups.entry(field_key(&row)).or_default().push(row);
    }
    let rows: Vec<Entry> = groups
        .into_values()
        .flat_map(|group| mapper.map_group(group))
        .collect();

    debug!(rows_before = before, rows_after = rows.len(), "applied mappings");
    Table::new(schema, rows)
}

/// Splits `prefix|name` into the prefix (with trailing `|`) when the last
/// segment equals `name`.
fn strip_last_segment<'v>(variable: &'v str, name: &str) -> Option<&'v str> {
    if variable == name {
        return Some("");
    }
    variable
        .strip_suffix(name)
        .filter(|prefix| prefix.ends_with('|'))
}

/// `Output Capacity|X` → `Output|X`.
fn flow_of(variable: &str) -> String {
    variable.replacen(" Capacity|", "|", 1)
}

fn is_capacity(variable: &str) -> bool {
    variable
        .split('|')
        .next()
        .is_some_and(|head| head.ends_with(" Capacity"))
}

/// Unit of the quantity a reference stands for: capacities count per year.
fn equivalent_unit(unit: &str, reference: &str) -> String {
    if is_capacity(reference) {
        format!("{unit}*{YEAR}")
    } else {
        unit.to_string()
    }
}

struct Mapper<'a> {
    targets: UnitTargets<'a>,
}

impl Mapper<'_> {
    fn map_group(&self, mut group: Vec<Entry>) -> Vec<Entry> {
        self.flh_to_ocf(&mut group);
        self.opex_fixed_relative(&mut group);
        self.opex_fixed_specific(&mut group);
        invert_efficiencies(&mut group);
        self.canonicalize_references(&mut group);
        group
    }

    fn factor(&self, from: Option<&str>, to: Option<&str>) -> f64 {
        self.targets.ctx().converter.factor(from, to, None)
    }

    fn target(&self, parent: &str, variable: &str) -> Option<&str> {
        self.targets.unit(&join_path(parent, variable))
    }

    fn flh_to_ocf(&self, group: &mut [Entry]) {
        for row in group.iter_mut() {
            let Some(prefix) = strip_last_segment(&row.variable, FLH) else {
                continue;
            };
            let variable = format!("{prefix}{OCF}");
            row.value *= self.factor(row.unit.as_deref(), Some(YEAR));
            let target = self.target(&row.parent_variable, &variable);
            if let Some(target) = target.filter(|t| *t != DIMENSIONLESS) {
                row.value *= self.factor(Some(DIMENSIONLESS), Some(target));
            }
            row.unit = Some(target.unwrap_or(DIMENSIONLESS).to_string());
            row.variable = variable;
        }
    }

    fn opex_fixed_relative(&self, group: &mut [Entry]) {
        let snapshot = group.to_vec();
        for row in group.iter_mut() {
            let Some(prefix) = strip_last_segment(&row.variable, OPEX_FIXED_RELATIVE) else {
                continue;
            };
            let prefix = prefix.to_string();
            let variable = format!("{prefix}{OPEX_FIXED}");
            let capex_variable = format!("{prefix}{CAPEX}");
            let target = self.target(&row.parent_variable, &variable);
            let capex = snapshot.iter().find(|r| r.variable == capex_variable);

            match capex {
                Some(capex) => {
                    let per_year = capex.unit.as_deref().map(|u| format!("{u}/{YEAR}"));
                    let target = target.map(str::to_string).or_else(|| per_year.clone());
                    row.value *= self.factor(row.unit.as_deref(), Some("1/a"))
                        * capex.value
                        * self.factor(per_year.as_deref(), target.as_deref());
                    row.unit = target;
                    row.reference_variable = capex.reference_variable.clone();
                    row.reference_value = capex.reference_value;
                    row.reference_unit = capex.reference_unit.clone();
                }
                None => {
                    warn!(
                        variable = %row.full_variable(),
                        missing = %capex_variable,
                        "no CAPEX row for relative fixed OPEX; value set to NaN"
                    );
                    row.value = f64::NAN;
                    row.unit = target.map(str::to_string);
                }
            }
            row.variable = variable;
        }
    }

    fn opex_fixed_specific(&self, group: &mut [Entry]) {
        let snapshot = group.to_vec();
        for row in group.iter_mut() {
            let Some(prefix) = strip_last_segment(&row.variable, OPEX_FIXED_SPECIFIC) else {
                continue;
            };
            let prefix = prefix.to_string();
            let variable = format!("{prefix}{OPEX_FIXED}");
            let ocf_variable = format!("{prefix}{OCF}");
            let target = self.target(&row.parent_variable, &variable).map(str::to_string);
            let reference = row.reference_variable.as_deref().map(capacity_of);
            let capacity_unit = reference
                .as_deref()
                .and_then(|r| self.target(&row.parent_variable, r))
                .map(str::to_string);

            match snapshot.iter().find(|r| r.variable == ocf_variable) {
                Some(ocf) => {
                    let per_year = row.unit.as_deref().map(|u| format!("{u}/{YEAR}"));
                    let capacity_year = capacity_unit.as_deref().map(|u| format!("{u}*{YEAR}"));
                    row.value *= ocf.value
                        * self.factor(per_year.as_deref(), target.as_deref())
                        * self.factor(capacity_year.as_deref(), row.reference_unit.as_deref());
                }
                None => {
                    warn!(
                        variable = %row.full_variable(),
                        missing = %ocf_variable,
                        "no OCF row for specific fixed OPEX; value set to NaN"
                    );
                    row.value = f64::NAN;
                }
            }
            row.variable = variable;
            row.unit = target;
            if reference.is_some() {
                row.reference_variable = reference;
                row.reference_unit = capacity_unit;
            }
        }
    }

    fn canonicalize_references(&self, group: &mut [Entry]) {
        let snapshot = group.to_vec();
        for row in group.iter_mut() {
            let Some(old) = row
                .reference_variable
                .clone()
                .filter(|r| FLOW_REFERENCE.is_match(r))
            else {
                continue;
            };
            let Some(new) = self.canonical_reference(row) else {
                continue;
            };
            if new == old {
                continue;
            }

            let new_unit = self.target(&row.parent_variable, &new).map(str::to_string);
            let (old_flow, new_flow) = (flow_of(&old), flow_of(&new));
            let sibling = snapshot.iter().find(|r| {
                r.variable == old_flow && r.reference_variable.as_deref() == Some(new_flow.as_str())
            });

            match (sibling, &new_unit) {
                (Some(m), Some(new_unit)) => {
                    let old_eq = row.reference_unit.as_deref().map(|u| equivalent_unit(u, &old));
                    let new_eq = equivalent_unit(new_unit, &new);
                    row.value *= m.value
                        * self.factor(Some(&new_eq), m.reference_unit.as_deref())
                        / self.factor(old_eq.as_deref(), m.unit.as_deref());
                }
                _ => {
                    warn!(
                        variable = %row.full_variable(),
                        reference = %old,
                        target = %new,
                        "cannot express value in default reference; value set to NaN"
                    );
                    row.value = f64::NAN;
                }
            }
            row.reference_variable = Some(new);
            row.reference_unit = new_unit;
        }
    }

    /// Registry default reference of the row's variable, relative to its parent.
    fn canonical_reference(&self, row: &Entry) -> Option<String> {
        let default = self
            .targets
            .ctx()
            .registry
            .default_reference(&row.full_variable())?;
        let relative = default
            .strip_prefix(row.parent_variable.as_str())
            .and_then(|rest| rest.strip_prefix('|'))?;
        Some(relative.to_string())
    }
}

/// `Input|X` → `Input Capacity|X`, unchanged when already a capacity.
fn capacity_of(reference: &str) -> String {
    match reference.split_once('|') {
        Some((head, rest)) if !head.ends_with(" Capacity") => format!("{head} Capacity|{rest}"),
        _ => reference.to_string(),
    }
}

/// Output-per-input rows become input-per-output rows.
fn invert_efficiencies(group: &mut [Entry]) {
    for row in group.iter_mut() {
        let Some(reference) = row.reference_variable.clone() else {
            continue;
        };
        if !OUTPUT_VARIABLE.is_match(&row.variable) || !INPUT_VARIABLE.is_match(&reference) {
            continue;
        }
        if row.value == 0.0 {
            warn!(
                variable = %row.full_variable(),
                reference = %reference,
                "cannot invert zero value; value set to NaN"
            );
            row.value = f64::NAN;
        } else {
            row.value = 1.0 / row.value;
        }
        row.reference_variable = Some(std::mem::replace(&mut row.variable, reference));
        std::mem::swap(&mut row.unit, &mut row.reference_unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment_matches_whole_segments_only() {
        assert_eq!(strip_last_segment("FLH", FLH), Some(""));
        assert_eq!(strip_last_segment("Stack|FLH", FLH), Some("Stack|"));
        assert_eq!(strip_last_segment("XFLH", FLH), None);
    }

    #[test]
    fn capacity_helpers() {
        assert_eq!(capacity_of("Output|Hydrogen"), "Output Capacity|Hydrogen");
        assert_eq!(capacity_of("Output Capacity|Hydrogen"), "Output Capacity|Hydrogen");
        assert_eq!(flow_of("Input Capacity|Electricity"), "Input|Electricity");
        assert_eq!(equivalent_unit("MW", "Output Capacity|Hydrogen"), "MW*a");
        assert_eq!(equivalent_unit("MWh", "Output|Hydrogen"), "MWh");
    }
}
