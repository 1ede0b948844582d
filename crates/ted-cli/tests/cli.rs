//! Argument parsing and command wiring.

use std::fs;

use clap::Parser;
use ted_cli::cli::{Cli, Command, parse_assignment, parse_selection};
use ted_cli::commands::{load_context, run_check, select_options};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("ted").chain(args.iter().copied())).unwrap()
}

// ============================================================================
// Value parsers
// ============================================================================

#[test]
fn test_parse_assignment_trims_parts() {
    assert_eq!(
        parse_assignment(" Tech|X|CAPEX = EUR_2020 ").unwrap(),
        ("Tech|X|CAPEX".to_string(), "EUR_2020".to_string())
    );
    assert!(parse_assignment("CAPEX").is_err());
    assert!(parse_assignment("=EUR_2020").is_err());
}

#[test]
fn test_parse_selection_splits_values() {
    let (field, values) = parse_selection("period=2030, 2040,,2050").unwrap();
    assert_eq!(field, "period");
    assert_eq!(values, vec!["2030", "2040", "2050"]);
}

// ============================================================================
// Subcommands
// ============================================================================

#[test]
fn test_select_arguments_map_to_options() {
    let cli = parse(&[
        "select",
        "Tech|Electrolysis",
        "--field",
        "period=2030,2040",
        "--unit",
        "Tech|Electrolysis|CAPEX=EUR_2020",
        "--keep-singular",
    ]);
    let Command::Select(args) = cli.command else {
        panic!("expected select");
    };
    assert_eq!(args.dataset.variable, "Tech|Electrolysis");

    let options = select_options(&args);
    assert!(!options.drop_singular_fields);
    assert!(options.extrapolate_period);
    assert_eq!(options.field_selections["period"], vec!["2030", "2040"]);
    assert_eq!(options.overrides["Tech|Electrolysis|CAPEX"], "EUR_2020");
}

#[test]
fn test_aggregate_flattens_select_arguments() {
    let cli = parse(&[
        "aggregate",
        "Tech|Electrolysis",
        "--agg-field",
        "source",
        "--no-database-masks",
        "--database",
        "public",
        "-o",
        "out.csv",
    ]);
    let Command::Aggregate(args) = cli.command else {
        panic!("expected aggregate");
    };
    assert_eq!(args.agg_fields, vec!["source"]);
    assert!(args.no_database_masks);
    assert_eq!(args.select.dataset.databases, vec!["public"]);
    assert!(args.select.dataset.output.is_some());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["variables", "Tech", "--config", "ted.toml", "--log-level", "debug"]);
    assert!(cli.config.is_some());
    assert!(cli.log_level.is_some());
    assert!(matches!(cli.command, Command::Variables(ref args) if args.prefix == "Tech"));
}

#[test]
fn test_invalid_selection_is_rejected() {
    let result = Cli::try_parse_from(["ted", "select", "Tech|X", "--field", "period"]);
    assert!(result.is_err());
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_counts_issues() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let definitions = root.join("public/definitions/variable");
    fs::create_dir_all(&definitions).unwrap();
    fs::write(
        definitions.join("tech.yml"),
        "Tech|Electrolysis|CAPEX:\n  default_unit: EUR_2024\n",
    )
    .unwrap();
    fs::write(
        root.join("ted.toml"),
        "[[databases]]\nid = \"public\"\npath = \"public\"\n",
    )
    .unwrap();
    let file = root.join("Electrolysis.csv");
    fs::write(&file, "variable,value,unit\nCAPEX,1000,EUR_2024\nLifetime,20,a\n").unwrap();

    let ctx = load_context(Some(root.join("ted.toml").as_path())).unwrap();
    let cli = parse(&["check", file.to_str().unwrap(), "--parent", "Tech|Electrolysis", "--json"]);
    let Command::Check(args) = cli.command else {
        panic!("expected check");
    };
    let issues = run_check(&ctx, &args).unwrap();
    assert!(issues >= 1);
}
