use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::Table;
use ehr_cli::config::{FileConfig, OptionOverrides};
use ehr_cli::run::{
    ConvertRequest, EpisodesRequest, Outcome, PatientClassRequest, SafetyRequest, run_convert,
    run_episodes, run_patient_classes, run_safety,
};
use ehr_cli::summary::apply_table_style;
use ehr_core::RowSchema;
use ehr_model::ConversionOptions;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{ConvertArgs, EpisodesArgs, PatientClassArgs, SafetyArgs};

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Settings shared by every subcommand.
pub struct Shared<'a> {
    pub file: FileConfig,
    pub overrides: &'a OptionOverrides,
    pub log_data: bool,
}

impl Shared<'_> {
    fn options(&self) -> ConversionOptions {
        self.overrides.apply(self.file.conversion.clone())
    }
}

pub fn run_schemas() {
    let mut table = Table::new();
    table.set_header(vec!["Schema", "Columns", "Terminology"]);
    apply_table_style(&mut table);
    for schema in RowSchema::ALL {
        let terminology = if schema.requires_terminology() {
            "required"
        } else {
            "-"
        };
        table.add_row(vec![schema.as_str(), schema.columns(), terminology]);
    }
    println!("{table}");
}

pub fn convert(args: ConvertArgs, shared: &Shared<'_>) -> Result<Outcome> {
    let schema = args
        .schema
        .or(shared.file.schema)
        .context("no row schema given; pass --schema or set `schema` in the config file")?;
    let request = ConvertRequest {
        rows: args.rows,
        terminology: args.terminology,
        schema,
        output: args.output,
        options: shared.options(),
        log_data: shared.log_data,
    };
    let spinner = spinner(&format!("converting {}", request.rows.display()));
    let result = run_convert(&request, |rows| {
        spinner.set_message(format!("{rows} rows processed"));
    });
    spinner.finish_and_clear();
    Ok(Outcome::Convert(result?))
}

pub fn episodes(args: EpisodesArgs, shared: &Shared<'_>) -> Result<Outcome> {
    let request = EpisodesRequest {
        input: args.input,
        output: args.output,
        options: shared.options(),
    };
    let spinner = spinner("segmenting encounters");
    let result = run_episodes(&request);
    spinner.finish_and_clear();
    Ok(Outcome::Episodes(result?))
}

pub fn safety(args: SafetyArgs, shared: &Shared<'_>) -> Result<Outcome> {
    let mut options = shared.options();
    if let Some(scale_factor) = args.scale_factor {
        options.sampling.scale_factor = scale_factor;
    }
    if let Some(seed) = args.seed {
        options.sampling.seed = Some(seed);
    }
    let reasoner_timeout = args
        .reasoner_timeout_ms
        .map(Duration::from_millis)
        .or_else(|| shared.file.reasoner.timeout());
    let request = SafetyRequest {
        contraindications: args.contraindications,
        conditions: args.conditions,
        categories: args.categories,
        indications: args.indications,
        order_details: args.order_details,
        terminology: args.terminology,
        output: args.output,
        options,
        reasoner_timeout,
    };
    let spinner = spinner("building drug safety graph");
    let result = run_safety(&request);
    spinner.finish_and_clear();
    Ok(Outcome::Safety(result?))
}

pub fn patient_classes(args: PatientClassArgs, shared: &Shared<'_>) -> Result<Outcome> {
    let request = PatientClassRequest {
        contraindications: args.contraindications,
        conditions: args.conditions,
        categories: args.categories,
        terminology: args.terminology,
        output: args.output,
        options: shared.options(),
    };
    let spinner = spinner("building patient classes");
    let result = run_patient_classes(&request);
    spinner.finish_and_clear();
    Ok(Outcome::PatientClasses(result?))
}

fn spinner(message: &str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
