//! `ehr-graph`: clinical knowledge graphs from EHR extracts.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use ehr_cli::config::FileConfig;
use ehr_cli::logging::{LogConfig, LogFormat, init_logging};
use ehr_cli::run::Outcome;
use ehr_cli::summary::print_summary;
use ehr_core::ConversionError;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::Shared;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    if matches!(cli.command, Command::Schemas) {
        commands::run_schemas();
        return 0;
    }
    let file = match FileConfig::load_optional(cli.config.as_deref()) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("error: {error:#}");
            return 1;
        }
    };
    let shared = Shared {
        file,
        overrides: &cli.overrides,
        log_data: cli.log_data,
    };
    let result: anyhow::Result<Outcome> = match cli.command {
        Command::Convert(args) => commands::convert(args, &shared),
        Command::Episodes(args) => commands::episodes(args, &shared),
        Command::Safety(args) => commands::safety(args, &shared),
        Command::PatientClasses(args) => commands::patient_classes(args, &shared),
        Command::Schemas => return 0,
    };
    match result {
        Ok(outcome) => {
            print_summary(&outcome);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            if let Some(failure) = error.downcast_ref::<ConversionError>() {
                eprintln!("rows processed before the failure: {}", failure.rows_processed);
            }
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
