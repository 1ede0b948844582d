//! CLI argument definitions for the `ted` harmonization tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ted",
    version,
    about = "Harmonize techno-economic data across databases",
    long_about = "Load, normalize, select and aggregate techno-economic data.\n\n\
                  Databases and defaults are read from ted.toml (or the file named\n\
                  by TED_CONFIG or --config)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: $TED_CONFIG, then ./ted.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize units and references and write the rows as a TEDF file.
    Normalize(NormalizeArgs),

    /// Select field values and print the harmonized table.
    Select(SelectArgs),

    /// Select, then aggregate components and sources with mask weights.
    Aggregate(AggregateArgs),

    /// Check a raw TEDF file for row-level inconsistencies.
    Check(CheckArgs),

    /// List registered variables below a prefix.
    Variables(VariablesArgs),
}

#[derive(Args)]
pub struct DatasetArgs {
    /// Parent variable to load, e.g. "Tech|Electrolysis".
    #[arg(value_name = "VARIABLE")]
    pub variable: String,

    /// Only read these databases (repeatable; default: all).
    #[arg(long = "database", value_name = "ID")]
    pub databases: Vec<String>,

    /// Additional TEDF file for the requested variable (repeatable).
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Target unit override, e.g. "Tech|Electrolysis|CAPEX=EUR_2020".
    #[arg(long = "unit", value_name = "VARIABLE=UNIT", value_parser = parse_assignment)]
    pub units: Vec<(String, String)>,

    /// Write the result as CSV instead of printing it.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

#[derive(Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Field selection, e.g. "period=2030,2040" (repeatable).
    #[arg(long = "field", value_name = "FIELD=V1,V2", value_parser = parse_selection)]
    pub fields: Vec<(String, Vec<String>)>,

    /// Keep custom fields that hold a single value.
    #[arg(long = "keep-singular")]
    pub keep_singular: bool,

    /// Omit periods outside the reported range instead of clamping.
    #[arg(long = "no-extrapolate")]
    pub no_extrapolate: bool,
}

#[derive(Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Field to aggregate over (repeatable; default: components and source).
    #[arg(long = "agg-field", value_name = "FIELD")]
    pub agg_fields: Vec<String>,

    /// Ignore masks defined by the databases.
    #[arg(long = "no-database-masks")]
    pub no_database_masks: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Raw TEDF file to check.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Parent variable the file's rows belong to.
    #[arg(long = "parent", value_name = "VARIABLE")]
    pub parent: String,

    /// Print issues as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct VariablesArgs {
    /// Only list variables at or below this path.
    #[arg(value_name = "PREFIX", default_value = "")]
    pub prefix: String,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Parses `KEY=VALUE`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses `FIELD=V1,V2,...`.
pub fn parse_selection(raw: &str) -> Result<(String, Vec<String>), String> {
    let (field, values) = parse_assignment(raw)?;
    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    Ok((field, values))
}
