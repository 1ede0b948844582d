use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use tracing::{debug, info_span};

use ted_core::{
    AggregateOptions, Dataset, DatasetOptions, OutputTable, SelectOptions, UnitOverrides, cleanup,
};
use ted_database::{Context, Settings, load_field_set, merge_field_sets};
use ted_ingest::RecordFile;

use crate::cli::{AggregateArgs, CheckArgs, DatasetArgs, NormalizeArgs, SelectArgs, VariablesArgs};
use crate::summary::{print_issues, print_output, print_variables};

pub fn load_context(config: Option<&Path>) -> Result<Arc<Context>> {
    let settings = Settings::discover(config).context("load settings")?;
    let ctx = Context::load(settings).context("load databases")?;
    Ok(ctx.into_shared())
}

pub fn run_normalize(ctx: Arc<Context>, args: &NormalizeArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.dataset)?;
    let overrides: UnitOverrides = args.dataset.units.iter().cloned().collect();
    let table = dataset.normalize(&overrides);
    match &args.dataset.output {
        Some(path) => {
            RecordFile::from_rows(dataset.parent_variable(), table.schema, table.rows)
                .write(path)
                .with_context(|| format!("write {}", path.display()))?;
        }
        None => print_output(&cleanup(&table)),
    }
    Ok(())
}

pub fn run_select(ctx: Arc<Context>, args: &SelectArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.dataset)?;
    let output = dataset
        .select(&select_options(args))
        .with_context(|| format!("select {}", dataset.parent_variable()))?;
    emit(&output, args.dataset.output.as_deref())
}

pub fn run_aggregate(ctx: Arc<Context>, args: &AggregateArgs) -> Result<()> {
    let dataset = load_dataset(ctx, &args.select.dataset)?;
    let options = AggregateOptions {
        select: select_options(&args.select),
        agg_fields: (!args.agg_fields.is_empty()).then(|| args.agg_fields.clone()),
        masks: Vec::new(),
        masks_database: !args.no_database_masks,
    };
    let output = dataset
        .aggregate(&options)
        .with_context(|| format!("aggregate {}", dataset.parent_variable()))?;
    emit(&output, args.select.dataset.output.as_deref())
}

/// Returns the number of issues found.
pub fn run_check(ctx: &Context, args: &CheckArgs) -> Result<usize> {
    let span = info_span!("check", file = %args.file.display());
    let _guard = span.enter();

    let mut sets = Vec::new();
    for db in &ctx.databases {
        if let Some(set) = load_field_set(db, &args.parent)
            .with_context(|| format!("load fields of {} from {}", args.parent, db.id))?
        {
            sets.push(set);
        }
    }
    let schema = merge_field_sets(&sets).context("merge field definitions")?;
    let record = RecordFile::read(&args.parent, Arc::new(schema), &args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    let issues = record.check(ctx);
    debug!(rows = record.len(), issues = issues.len(), "checked");

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&issues).context("serialize issues")?
        );
    } else {
        print_issues(&issues);
    }
    Ok(issues.len())
}

pub fn run_variables(ctx: &Context, args: &VariablesArgs) -> Result<()> {
    let variables: Vec<_> = if args.prefix.is_empty() {
        ctx.registry.iter().collect()
    } else {
        ctx.registry.resolve(&args.prefix)
    };
    if variables.is_empty() {
        bail!("no variables registered below '{}'", args.prefix);
    }
    print_variables(&variables);
    Ok(())
}

fn load_dataset(ctx: Arc<Context>, args: &DatasetArgs) -> Result<Dataset> {
    let mut options = DatasetOptions::default();
    if !args.databases.is_empty() {
        options = options.with_databases(args.databases.iter().cloned());
    }
    for path in &args.files {
        options = options.with_extra_file(path);
    }
    Dataset::load(ctx, &args.variable, options)
        .with_context(|| format!("load {}", args.variable))
}

pub fn select_options(args: &SelectArgs) -> SelectOptions {
    let mut options = SelectOptions {
        drop_singular_fields: !args.keep_singular,
        extrapolate_period: !args.no_extrapolate,
        ..SelectOptions::default()
    };
    for (variable, unit) in &args.dataset.units {
        options = options.with_override(variable, unit);
    }
    for (field, values) in &args.fields {
        options = options.with_selection(field, values);
    }
    options
}

fn emit(output: &OutputTable, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => output
            .write_csv(path)
            .with_context(|| format!("write {}", path.display())),
        None => {
            print_output(output);
            Ok(())
        }
    }
}
