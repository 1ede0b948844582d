//! A single data row.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::columns::{
    COL_PARENT_VARIABLE, COL_PERIOD, COL_REFERENCE_UNIT, COL_REFERENCE_VALUE,
    COL_REFERENCE_VARIABLE, COL_UNCERTAINTY, COL_UNIT, COL_VALUE, COL_VARIABLE,
};
use crate::values::{format_number, format_optional};

/// Joins a parent path and a relative path with `|`.
pub fn join_path(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}|{child}"),
    }
}

/// One entry row, tagged with the parent variable it belongs to.
///
/// `value` is NaN when missing or when a computation failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub parent_variable: String,
    pub variable: String,
    pub reference_variable: Option<String>,
    pub value: f64,
    pub uncertainty: Option<f64>,
    pub unit: Option<String>,
    pub reference_value: Option<f64>,
    pub reference_unit: Option<String>,
    /// Field cells keyed by field id (region, period, source and custom fields).
    pub fields: BTreeMap<String, String>,
    /// Comment cells keyed by column id.
    pub comments: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(parent_variable: impl Into<String>, variable: impl Into<String>, value: f64) -> Self {
        Self {
            parent_variable: parent_variable.into(),
            variable: variable.into(),
            reference_variable: None,
            value,
            uncertainty: None,
            unit: None,
            reference_value: None,
            reference_unit: None,
            fields: BTreeMap::new(),
            comments: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_reference(
        mut self,
        variable: impl Into<String>,
        value: Option<f64>,
        unit: impl Into<String>,
    ) -> Self {
        self.reference_variable = Some(variable.into());
        self.reference_value = value;
        self.reference_unit = Some(unit.into());
        self
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    pub fn with_field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(id.into(), value.into());
        self
    }

    pub fn with_comment(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.comments.insert(id.into(), value.into());
        self
    }

    /// Fully qualified variable path, `parent|variable`.
    pub fn full_variable(&self) -> String {
        join_path(&self.parent_variable, &self.variable)
    }

    /// Fully qualified reference variable path, if the row has a reference.
    pub fn full_reference(&self) -> Option<String> {
        self.reference_variable
            .as_deref()
            .map(|reference| join_path(&self.parent_variable, reference))
    }

    pub fn field(&self, id: &str) -> Option<&str> {
        self.fields.get(id).map(String::as_str)
    }

    pub fn set_field(&mut self, id: &str, value: impl Into<String>) {
        self.fields.insert(id.to_string(), value.into());
    }

    pub fn period(&self) -> Option<&str> {
        self.field(COL_PERIOD)
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_nan()
    }

    /// Renders any column as its CSV cell text.
    pub fn cell(&self, id: &str) -> String {
        match id {
            COL_PARENT_VARIABLE => self.parent_variable.clone(),
            COL_VARIABLE => self.variable.clone(),
            COL_REFERENCE_VARIABLE => self.reference_variable.clone().unwrap_or_default(),
            COL_VALUE => format_number(self.value),
            COL_UNCERTAINTY => format_optional(self.uncertainty),
            COL_UNIT => self.unit.clone().unwrap_or_default(),
            COL_REFERENCE_VALUE => format_optional(self.reference_value),
            COL_REFERENCE_UNIT => self.reference_unit.clone().unwrap_or_default(),
            other => self
                .fields
                .get(other)
                .or_else(|| self.comments.get(other))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_paths_join_parent() {
        let entry = Entry::new("Tech|Electrolysis", "CAPEX", 1000.0)
            .with_reference("Output Capacity|Hydrogen", None, "kW");
        assert_eq!(entry.full_variable(), "Tech|Electrolysis|CAPEX");
        assert_eq!(
            entry.full_reference().as_deref(),
            Some("Tech|Electrolysis|Output Capacity|Hydrogen")
        );
    }

    #[test]
    fn cell_renders_missing_as_empty() {
        let entry = Entry::new("Tech|X", "CAPEX", f64::NAN).with_field("period", "2030");
        assert_eq!(entry.cell(COL_VALUE), "");
        assert_eq!(entry.cell(COL_PERIOD), "2030");
        assert_eq!(entry.cell(COL_REFERENCE_VALUE), "");
    }

    #[test]
    fn join_path_skips_empty_segments() {
        assert_eq!(join_path("", "CAPEX"), "CAPEX");
        assert_eq!(join_path("Tech|X", ""), "Tech|X");
    }
}
