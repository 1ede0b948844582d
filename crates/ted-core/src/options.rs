use std::collections::BTreeMap;
use std::path::PathBuf;

use ted_model::{Mask, Table};

/// Target unit overrides keyed by fully qualified variable path.
pub type UnitOverrides = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    /// Database ids to read. None reads every registered database.
    pub include_databases: Option<Vec<String>>,
    /// Additional TEDF files whose rows belong to the requested scope.
    pub extra_files: Vec<PathBuf>,
    /// Additional in-memory rows, already tagged with their parent variable.
    pub extra_tables: Vec<Table>,
}

impl DatasetOptions {
    pub fn with_databases(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include_databases = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_extra_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_files.push(path.into());
        self
    }

    pub fn with_extra_table(mut self, table: Table) -> Self {
        self.extra_tables.push(table);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SelectOptions {
    pub overrides: UnitOverrides,
    /// Drop custom fields that hold a single value after selection.
    pub drop_singular_fields: bool,
    /// Clamp requested periods outside the reported range to the nearest one.
    pub extrapolate_period: bool,
    /// Requested values per field id. Missing fields use their defaults.
    pub field_selections: BTreeMap<String, Vec<String>>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            overrides: UnitOverrides::new(),
            drop_singular_fields: true,
            extrapolate_period: true,
            field_selections: BTreeMap::new(),
        }
    }
}

impl SelectOptions {
    pub fn with_selection(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.field_selections
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_override(mut self, variable: impl Into<String>, unit: impl Into<String>) -> Self {
        self.overrides.insert(variable.into(), unit.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub select: SelectOptions,
    /// Fields to aggregate over. None uses component fields plus `source`.
    pub agg_fields: Option<Vec<String>>,
    /// Applied after the database masks, in order.
    pub masks: Vec<Mask>,
    pub masks_database: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            select: SelectOptions::default(),
            agg_fields: None,
            masks: Vec::new(),
            masks_database: true,
        }
    }
}
