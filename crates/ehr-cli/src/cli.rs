//! Argument definitions for `ehr-graph`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ehr_cli::config::OptionOverrides;
use ehr_core::RowSchema;

#[derive(Parser)]
#[command(
    name = "ehr-graph",
    version,
    about = "Build clinical knowledge graphs from EHR extracts",
    long_about = "Build clinical knowledge graphs from EHR extracts.\n\n\
                  Maps row extracts onto a code-system vocabulary, splits encounters\n\
                  into per-date episodes, and cross-references drugs with their\n\
                  indications and contraindications."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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

    /// Include row contents in trace-level logs. They may identify patients.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// TOML file with run options; flags take precedence.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map a row extract into a graph document.
    Convert(ConvertArgs),

    /// Split every encounter of a graph document into per-date episodes.
    Episodes(EpisodesArgs),

    /// Build the drug indication and contraindication graph.
    Safety(SafetyArgs),

    /// Model contraindications as patient class definitions.
    PatientClasses(PatientClassArgs),

    /// List the supported row schemas.
    Schemas,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Comma-delimited row extract with one header line.
    #[arg(value_name = "ROWS")]
    pub rows: PathBuf,

    /// Code-system export (Class ID, Preferred Label, Parents).
    #[arg(long, value_name = "CSV")]
    pub terminology: Option<PathBuf>,

    /// Row layout of the extract (see `ehr-graph schemas`).
    #[arg(long, value_name = "NAME")]
    pub schema: Option<RowSchema>,

    /// Graph document to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct EpisodesArgs {
    /// Graph document written by `convert`.
    #[arg(value_name = "IN")]
    pub input: PathBuf,

    /// Segmented graph document to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct SafetyArgs {
    /// Drug contraindication table.
    #[arg(long, value_name = "CSV")]
    pub contraindications: PathBuf,

    /// Condition id to terminology code map.
    #[arg(long, value_name = "CSV")]
    pub conditions: PathBuf,

    /// Drug category table.
    #[arg(long, value_name = "CSV")]
    pub categories: PathBuf,

    /// Drug indication table.
    #[arg(long, value_name = "CSV")]
    pub indications: Option<PathBuf>,

    /// Order details (form, dose, quantity, route, frequency, duration) per drug.
    #[arg(long = "order-details", value_name = "CSV", requires = "indications")]
    pub order_details: Option<PathBuf>,

    /// Code-system export used for condition labels and the subsumption closure.
    #[arg(long, value_name = "CSV")]
    pub terminology: PathBuf,

    /// Probability of keeping each indication row.
    #[arg(long = "scale-factor", value_name = "F")]
    pub scale_factor: Option<f64>,

    /// Seed for reproducible sampling.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Give up on classification after this many milliseconds.
    #[arg(long = "reasoner-timeout-ms", value_name = "MS")]
    pub reasoner_timeout_ms: Option<u64>,

    /// Graph document to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct PatientClassArgs {
    /// Drug contraindication table.
    #[arg(long, value_name = "CSV")]
    pub contraindications: PathBuf,

    /// Condition id to terminology code map.
    #[arg(long, value_name = "CSV")]
    pub conditions: PathBuf,

    /// Drug category table.
    #[arg(long, value_name = "CSV")]
    pub categories: PathBuf,

    /// Code-system export; its hierarchy is part of the output.
    #[arg(long, value_name = "CSV")]
    pub terminology: PathBuf,

    /// Graph document to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
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
