//! Techno-economic data harmonization CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use ted_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use ted_cli::commands::{
    load_context, run_aggregate, run_check, run_normalize, run_select, run_variables,
};
use ted_cli::logging::{LogConfig, LogFormat, init_logging};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let ctx = load_context(cli.config.as_deref())?;
    match cli.command {
        Command::Normalize(args) => run_normalize(ctx, &args).map(|()| 0),
        Command::Select(args) => run_select(ctx, &args).map(|()| 0),
        Command::Aggregate(args) => run_aggregate(ctx, &args).map(|()| 0),
        Command::Check(args) => run_check(&ctx, &args).map(|issues| i32::from(issues > 0)),
        Command::Variables(args) => run_variables(&ctx, &args).map(|()| 0),
    }
}

/// Explicit `--log-level` wins over `-v/-q`; either disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = cli.log_level.map_or_else(
        || cli.verbosity.tracing_level_filter(),
        |level| match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        },
    );
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter,
        use_env_filter: !cli.verbosity.is_present() && cli.log_level.is_none(),
        with_ansi,
        format,
        log_file: cli.log_file.clone(),
        ..LogConfig::default()
    }
}
