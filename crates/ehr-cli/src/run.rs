//! The stages behind the subcommands.
//!
//! Each stage builds its graph completely in memory and writes it only at
//! the end, so a failed stage never leaves an output document behind.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use ehr_core::{
    ConversionContext, EpisodeReport, RowSchema, RunSettings, RunStats, convert_rows,
    segment_episodes,
};
use ehr_ingest::RowReader;
use ehr_model::{ConversionOptions, Graph, Vocabulary};
use ehr_output::{read_graph, write_graph};
use ehr_reason::{
    Classification, ClassificationRequest, Classifier, ReasonerError, TaxonomyClassifier,
};
use ehr_safety::{
    NoClosure, PatientClassReport, SafetyRecords, SafetyReport, SafetySources, Table,
    build_patient_classes, build_safety_graph,
};
use ehr_terminology::{VocabularyRegistry, load_terminology};
use ehr_transform::CellNormalizer;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub rows: PathBuf,
    pub terminology: Option<PathBuf>,
    pub schema: RowSchema,
    pub output: PathBuf,
    pub options: ConversionOptions,
    pub log_data: bool,
}

#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub schema: RowSchema,
    pub stats: RunStats,
    /// Assertions in the written document, terminology included.
    pub assertions: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EpisodesRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: ConversionOptions,
}

#[derive(Debug, Clone)]
pub struct EpisodesOutcome {
    pub report: EpisodeReport,
    pub assertions: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SafetyRequest {
    pub contraindications: PathBuf,
    pub conditions: PathBuf,
    pub categories: PathBuf,
    pub indications: Option<PathBuf>,
    pub order_details: Option<PathBuf>,
    pub terminology: PathBuf,
    pub output: PathBuf,
    pub options: ConversionOptions,
    pub reasoner_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SafetyOutcome {
    pub report: SafetyReport,
    /// Why the subsumption closure was unavailable, if it was.
    pub closure_error: Option<ReasonerError>,
    pub assertions: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PatientClassRequest {
    pub contraindications: PathBuf,
    pub conditions: PathBuf,
    pub categories: PathBuf,
    pub terminology: PathBuf,
    pub output: PathBuf,
    pub options: ConversionOptions,
}

#[derive(Debug, Clone)]
pub struct PatientClassOutcome {
    pub report: PatientClassReport,
    /// Assertions in the written document, terminology included.
    pub assertions: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Convert(ConvertOutcome),
    Episodes(EpisodesOutcome),
    Safety(SafetyOutcome),
    PatientClasses(PatientClassOutcome),
}

impl Outcome {
    pub fn output(&self) -> &Path {
        match self {
            Outcome::Convert(outcome) => &outcome.output,
            Outcome::Episodes(outcome) => &outcome.output,
            Outcome::Safety(outcome) => &outcome.output,
            Outcome::PatientClasses(outcome) => &outcome.output,
        }
    }
}

/// Maps a row extract into a graph and writes it.
///
/// A failure while reading rows surfaces as
/// [`ConversionError`](ehr_core::ConversionError) inside the returned error,
/// carrying the number of rows processed.
pub fn run_convert(
    request: &ConvertRequest,
    on_progress: impl FnMut(u64),
) -> Result<ConvertOutcome> {
    let span = info_span!("convert", schema = %request.schema);
    let _guard = span.enter();
    let start = Instant::now();
    let options = &request.options;
    options.validate().context("invalid configuration")?;

    let mut registry = VocabularyRegistry::new(options);
    let mut graph = Graph::new(options.namespace().document_iri().context("namespace")?);
    match &request.terminology {
        Some(path) => load_hierarchy(path, &mut registry, &mut graph)?,
        None if request.schema.requires_terminology() => {
            bail!("schema {} resolves codes and needs --terminology", request.schema)
        }
        None => {}
    }

    let ctx = ConversionContext::new(&registry, options).context("invalid configuration")?;
    let rows = RowReader::open(&request.rows)
        .with_context(|| format!("open {}", request.rows.display()))?;
    let settings = RunSettings::from_options(options).with_log_data(request.log_data);
    let stats = convert_rows(rows, request.schema, &ctx, &mut graph, settings, on_progress)
        .with_context(|| format!("convert {}", request.rows.display()))?;

    write_graph(&graph, &request.output)
        .with_context(|| format!("write {}", request.output.display()))?;
    info!(elapsed_ms = start.elapsed().as_millis(), "convert stage finished");
    Ok(ConvertOutcome {
        schema: request.schema,
        stats,
        assertions: graph.len(),
        output: request.output.clone(),
    })
}

/// Splits every encounter of a written graph into per-date episodes.
pub fn run_episodes(request: &EpisodesRequest) -> Result<EpisodesOutcome> {
    let span = info_span!("segment", input = %request.input.display());
    let _guard = span.enter();
    let start = Instant::now();
    request.options.validate().context("invalid configuration")?;

    let graph = read_graph(&request.input)
        .with_context(|| format!("read {}", request.input.display()))?;
    let vocabulary = Vocabulary::new(&request.options);
    let (segmented, report) =
        segment_episodes(&graph, &vocabulary).context("segment encounters")?;

    write_graph(&segmented, &request.output)
        .with_context(|| format!("write {}", request.output.display()))?;
    info!(elapsed_ms = start.elapsed().as_millis(), "segment stage finished");
    Ok(EpisodesOutcome {
        report,
        assertions: segmented.len(),
        output: request.output.clone(),
    })
}

/// Builds the drug safety graph from the reference tables.
///
/// The terminology is classified first; if that fails the conditions are
/// taken as listed and the failure is reported in the outcome.
pub fn run_safety(request: &SafetyRequest) -> Result<SafetyOutcome> {
    let span = info_span!("safety");
    let _guard = span.enter();
    let start = Instant::now();
    let options = &request.options;
    options.validate().context("invalid configuration")?;

    let mut registry = VocabularyRegistry::new(options);
    let mut terminology = Graph::new(options.namespace().document_iri().context("namespace")?);
    load_hierarchy(&request.terminology, &mut registry, &mut terminology)?;
    let closure = classify(&terminology, request.reasoner_timeout);

    let contraindications = load_table(&request.contraindications)?;
    let conditions = load_table(&request.conditions)?;
    let categories = load_table(&request.categories)?;
    let indications = request.indications.as_deref().map(load_table).transpose()?;
    let order_details = request.order_details.as_deref().map(load_table).transpose()?;
    let sources = SafetySources {
        contraindications: &contraindications,
        conditions: &conditions,
        categories: &categories,
        indications: indications.as_ref(),
        order_details: order_details.as_ref(),
    };
    let normalizer =
        CellNormalizer::new(options.entity_delimiter.clone()).context("invalid configuration")?;
    let records = SafetyRecords::build(&sources, &options.sampling, &normalizer)
        .context("build drug safety records")?;

    let mut graph = Graph::new(options.namespace().document_iri().context("namespace")?);
    let report = match &closure {
        Ok(classification) => build_safety_graph(&records, &registry, classification, &mut graph),
        Err(_) => build_safety_graph(&records, &registry, &NoClosure, &mut graph),
    }
    .context("build drug safety graph")?;

    write_graph(&graph, &request.output)
        .with_context(|| format!("write {}", request.output.display()))?;
    info!(elapsed_ms = start.elapsed().as_millis(), "safety stage finished");
    Ok(SafetyOutcome {
        report,
        closure_error: closure.err(),
        assertions: graph.len(),
        output: request.output.clone(),
    })
}

/// Writes the contraindications as patient class definitions on top of the
/// terminology hierarchy.
pub fn run_patient_classes(request: &PatientClassRequest) -> Result<PatientClassOutcome> {
    let span = info_span!("patient_classes");
    let _guard = span.enter();
    let start = Instant::now();
    let options = &request.options;
    options.validate().context("invalid configuration")?;

    let mut registry = VocabularyRegistry::new(options);
    let mut graph = Graph::new(options.namespace().document_iri().context("namespace")?);
    load_hierarchy(&request.terminology, &mut registry, &mut graph)?;

    let contraindications = load_table(&request.contraindications)?;
    let conditions = load_table(&request.conditions)?;
    let categories = load_table(&request.categories)?;
    let sources = SafetySources {
        contraindications: &contraindications,
        conditions: &conditions,
        categories: &categories,
        indications: None,
        order_details: None,
    };
    let normalizer =
        CellNormalizer::new(options.entity_delimiter.clone()).context("invalid configuration")?;
    let records = SafetyRecords::build(&sources, &options.sampling, &normalizer)
        .context("build drug safety records")?;
    let report = build_patient_classes(&records.contraindications, &registry, &mut graph)
        .context("build patient classes")?;

    write_graph(&graph, &request.output)
        .with_context(|| format!("write {}", request.output.display()))?;
    info!(elapsed_ms = start.elapsed().as_millis(), "patient class stage finished");
    Ok(PatientClassOutcome {
        report,
        assertions: graph.len(),
        output: request.output.clone(),
    })
}

fn load_hierarchy(
    path: &Path,
    registry: &mut VocabularyRegistry,
    graph: &mut Graph,
) -> Result<()> {
    let source =
        load_terminology(path).with_context(|| format!("load terminology {}", path.display()))?;
    registry
        .load_code_hierarchy(&source, graph)
        .with_context(|| format!("load code hierarchy from {}", path.display()))?;
    Ok(())
}

fn load_table(path: &Path) -> Result<Table> {
    Table::load(path).with_context(|| format!("load {}", path.display()))
}

fn classify(graph: &Graph, timeout: Option<Duration>) -> Result<Classification, ReasonerError> {
    let mut request = ClassificationRequest::new(graph);
    if let Some(timeout) = timeout {
        request = request.with_timeout(timeout);
    }
    TaxonomyClassifier::new().classify(request).inspect_err(|error| {
        warn!(%error, "subsumption closure unavailable; conditions are taken as listed");
    })
}
