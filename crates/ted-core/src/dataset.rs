//! All rows of one parent-variable scope across the selected databases.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ted_database::{Context, Database, FieldSet, load_field_set, load_masks, merge_field_sets};
use ted_ingest::{DiscoveredFile, RecordFile, discover_files};
use ted_model::columns::{COL_PERIOD, COL_REGION, COL_SOURCE, COL_UNCERTAINTY};
use ted_model::{Entry, Mask, Result, Table, TableSchema, TedError};
use tracing::{debug, info, info_span, warn};

use crate::aggregate::{aggregate, resolve_agg_fields};
use crate::cleanup::cleanup;
use crate::expand::FieldExpander;
use crate::mappings::apply_mappings;
use crate::masking::MaskEngine;
use crate::normalize::normalize;
use crate::options::{AggregateOptions, DatasetOptions, SelectOptions, UnitOverrides};
use crate::output::OutputTable;

#[derive(Debug, Clone)]
pub struct Dataset {
    ctx: Arc<Context>,
    parent_variable: String,
    table: Table,
    masks: Vec<Mask>,
    files: Vec<DiscoveredFile>,
}

impl Dataset {
    /// Loads every row belonging to `parent_variable`.
    ///
    /// Rows from ancestor and nested files are re-expressed relative to
    /// `parent_variable`; rows outside the scope and rows naming unknown
    /// variables are dropped.
    pub fn load(
        ctx: Arc<Context>,
        parent_variable: impl Into<String>,
        options: DatasetOptions,
    ) -> Result<Self> {
        let parent_variable = parent_variable.into();
        let span = info_span!("dataset_load", parent_variable = %parent_variable);
        let _guard = span.enter();
        let start = Instant::now();

        let databases = ctx.databases_for(options.include_databases.as_deref());
        let mut files = Vec::new();
        for db in &databases {
            files.extend(discover_files(db, &parent_variable)?);
        }
        if files.is_empty() && options.extra_files.is_empty() && options.extra_tables.is_empty() {
            return Err(TedError::NoData {
                variable: parent_variable,
            });
        }

        let schema = Arc::new(merged_schema(&databases, &files, &parent_variable)?);

        let mut rows = Vec::new();
        for file in &files {
            let record = RecordFile::read(&file.parent_variable, Arc::clone(&schema), &file.path)?;
            rows.extend(record.rows);
        }
        for path in &options.extra_files {
            let record = RecordFile::read(&parent_variable, Arc::clone(&schema), path)?;
            rows.extend(record.rows);
        }
        for table in options.extra_tables {
            rows.extend(conform_rows(table.rows, &schema)?);
        }

        let read = rows.len();
        let rows = rescope(rows, &parent_variable);
        let rows = drop_unknown_variables(rows, &ctx);

        let mut masks = Vec::new();
        for db in &databases {
            masks.extend(load_masks(db, &parent_variable)?);
        }

        info!(
            files = files.len(),
            rows_read = read,
            rows = rows.len(),
            masks = masks.len(),
            duration_ms = start.elapsed().as_millis(),
            "loaded dataset"
        );
        Ok(Self {
            table: Table::new(schema, rows),
            ctx,
            parent_variable,
            masks,
            files,
        })
    }

    pub fn parent_variable(&self) -> &str {
        &self.parent_variable
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn schema(&self) -> &TableSchema {
        &self.table.schema
    }

    /// Masks defined by the databases for this scope.
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn files(&self) -> &[DiscoveredFile] {
        &self.files
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Rows expressed per one reference unit in target units.
    pub fn normalize(&self, overrides: &UnitOverrides) -> Table {
        normalize(self.table.clone(), &self.ctx, overrides)
    }

    /// Runs the selection pipeline and returns the working table.
    pub fn select_table(&self, options: &SelectOptions) -> Result<Table> {
        let span = info_span!("select", parent_variable = %self.parent_variable);
        let _guard = span.enter();

        if let Some(unknown) = options
            .field_selections
            .keys()
            .find(|id| self.schema().field(id).is_none())
        {
            return Err(TedError::UnknownField {
                field: unknown.clone(),
                variable: self.parent_variable.clone(),
            });
        }

        let mut table = project(self.normalize(&options.overrides));
        let expander = FieldExpander::new(&self.parent_variable, &self.ctx.settings.default_periods);
        let mut order: Vec<String> = table.schema.custom_fields().map(|f| f.id.clone()).collect();
        order.extend([COL_SOURCE, COL_REGION, COL_PERIOD].map(str::to_string));

        for field in &order {
            let requested = options.field_selections.get(field).map(Vec::as_slice);
            table = expander.select_and_expand(table, field, requested, options.extrapolate_period)?;
        }

        let table = apply_mappings(table, &self.ctx, &options.overrides);
        let before = table.len();
        let rows: Vec<Entry> = table.rows.iter().filter(|row| row.has_value()).cloned().collect();
        let mut table = table.with_rows(rows);
        debug!(dropped = before - table.len(), "dropped rows without value");

        if options.drop_singular_fields {
            table = drop_singular_fields(table);
        }
        info!(rows = table.len(), "selected table");
        Ok(table)
    }

    pub fn select(&self, options: &SelectOptions) -> Result<OutputTable> {
        Ok(cleanup(&self.select_table(options)?))
    }

    /// Selects, then collapses the aggregation fields with mask weights.
    ///
    /// Database masks apply before the caller's masks.
    pub fn aggregate(&self, options: &AggregateOptions) -> Result<OutputTable> {
        let mut agg_fields = resolve_agg_fields(
            self.schema(),
            options.agg_fields.as_deref(),
            &self.parent_variable,
        )?;
        let table = self.select_table(&options.select)?;
        agg_fields.retain(|id| table.schema.contains(id));

        let mut masks = Vec::new();
        if options.masks_database {
            masks.extend(self.masks.iter().cloned());
        }
        masks.extend(options.masks.iter().cloned());
        let engine = MaskEngine::new(&masks)?;

        let span = info_span!("aggregate", parent_variable = %self.parent_variable);
        let _guard = span.enter();
        Ok(cleanup(&aggregate(&table, &agg_fields, &engine)))
    }
}

/// Field schema from `fields/<path>.yml` for the scope and every file parent.
fn merged_schema(
    databases: &[&Database],
    files: &[DiscoveredFile],
    parent_variable: &str,
) -> Result<TableSchema> {
    let mut scopes: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for db in databases {
        scopes.entry(db.id.as_str()).or_default().insert(parent_variable);
    }
    for file in files {
        scopes
            .entry(file.database_id.as_str())
            .or_default()
            .insert(file.parent_variable.as_str());
    }

    let mut sets: Vec<FieldSet> = Vec::new();
    for db in databases {
        for scope in scopes.get(db.id.as_str()).into_iter().flatten() {
            if let Some(set) = load_field_set(db, scope)? {
                sets.push(set);
            }
        }
    }
    let schema = merge_field_sets(&sets)?;
    debug!(
        field_files = sets.len(),
        columns = schema.columns().len(),
        "merged field schema"
    );
    Ok(schema)
}

/// Fills missing field cells of in-memory rows and rejects unknown ones.
fn conform_rows(rows: Vec<Entry>, schema: &TableSchema) -> Result<Vec<Entry>> {
    let origin = Path::new("<table>");
    rows.into_iter()
        .map(|mut row| {
            if let Some(unknown) = row
                .fields
                .keys()
                .chain(row.comments.keys())
                .find(|id| !schema.contains(id))
            {
                return Err(TedError::UnknownColumn {
                    column: unknown.clone(),
                    path: PathBuf::from(origin),
                });
            }
            for field in schema.fields() {
                if !row.fields.contains_key(&field.id) {
                    row.set_field(&field.id, field.default_value());
                }
            }
            Ok(row)
        })
        .collect()
}

/// `a|b` relative to scope `a`, or None when `full` lies outside it.
fn relative_to<'p>(full: &'p str, scope: &str) -> Option<&'p str> {
    if scope.is_empty() {
        return Some(full);
    }
    full.strip_prefix(scope)?.strip_prefix('|')
}

fn rescope(rows: Vec<Entry>, scope: &str) -> Vec<Entry> {
    let before = rows.len();
    let rows: Vec<Entry> = rows
        .into_iter()
        .filter_map(|mut row| {
            let variable = relative_to(&row.full_variable(), scope)?.to_string();
            let reference = match row.full_reference() {
                Some(full) => Some(relative_to(&full, scope)?.to_string()),
                None => None,
            };
            row.parent_variable = scope.to_string();
            row.variable = variable;
            row.reference_variable = reference;
            Some(row)
        })
        .collect();
    if rows.len() < before {
        debug!(
            dropped = before - rows.len(),
            scope, "dropped rows outside the requested scope"
        );
    }
    rows
}

fn drop_unknown_variables(rows: Vec<Entry>, ctx: &Context) -> Vec<Entry> {
    let mut unknown: BTreeSet<String> = BTreeSet::new();
    rows.into_iter()
        .filter(|row| {
            let candidates = std::iter::once(row.full_variable()).chain(row.full_reference());
            let mut known = true;
            for path in candidates {
                if !ctx.registry.contains(&path) {
                    known = false;
                    if !unknown.contains(&path) {
                        warn!(variable = %path, "unknown variable; rows dropped");
                        unknown.insert(path);
                    }
                }
            }
            known
        })
        .collect()
}

/// Drops uncertainty and comment columns before selection.
fn project(table: Table) -> Table {
    let mut dropped = table.schema.comment_ids();
    dropped.push(COL_UNCERTAINTY);
    let schema = Arc::new(table.schema.without_columns(&dropped));
    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            row.uncertainty = None;
            row.comments.clear();
            row
        })
        .collect();
    Table::new(schema, rows)
}

/// Removes custom fields that hold at most one distinct value.
fn drop_singular_fields(table: Table) -> Table {
    let singular: Vec<String> = table
        .schema
        .custom_fields()
        .filter(|field| {
            let values: BTreeSet<Option<&str>> =
                table.rows.iter().map(|row| row.field(&field.id)).collect();
            values.len() <= 1
        })
        .map(|field| field.id.clone())
        .collect();
    if singular.is_empty() {
        return table;
    }
    debug!(fields = ?singular, "dropped singular fields");

    let ids: Vec<&str> = singular.iter().map(String::as_str).collect();
    let schema = Arc::new(table.schema.without_columns(&ids));
    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            for id in &ids {
                row.fields.remove(*id);
            }
            row
        })
        .collect();
    Table::new(schema, rows)
}
