mod common;

use common::{Fixture, row};
use ehr_core::{ConversionFailure, RowSchema, RunSettings, convert_rows, reconcile_max_age};
use ehr_ingest::{IngestError, RowReader, SourceRow};
use ehr_model::{Assertion, Fact, Literal};

const POPULATION: &str = "\
patient,age,gender,race,condition
P1,70,Female,Caucasian,250
P1,85,Female,Caucasian,250.1
P2,40,Male,Asian,401.9
P3,120,Male,Asian,401.9
P4,50,Male,Asian,123.4
";

fn ages(fx: &Fixture, patient: &str) -> Vec<Literal> {
    let has_age = fx.property("hasAge");
    let subject = fx.individual(patient);
    fx.graph
        .data_assertions(&has_age)
        .filter_map(|a| match &a.fact {
            Fact::DataProperty { subject: s, value, .. } if s == &subject => Some(value.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn population_run_tallies_rejections_and_keeps_max_age() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    let rows = RowReader::from_reader("population.csv", POPULATION.as_bytes());

    let stats = convert_rows(
        rows,
        RowSchema::PatientPopulationDiagnosisCoded,
        &ctx,
        &mut fx.graph,
        RunSettings::default(),
        |_| {},
    )
    .expect("conversion");

    assert_eq!(stats.rows_read, 5);
    assert_eq!(stats.rows_mapped, 3);
    assert_eq!(stats.rejections.get("age-out-of-range"), Some(&1));
    assert_eq!(stats.rejections.get("unresolved-code"), Some(&1));
    assert_eq!(stats.rows_rejected(), 2);
    assert_eq!(stats.ages_reconciled, 1);
    assert_eq!(ages(&fx, "P1"), vec![Literal::integer(85)]);
    assert_eq!(ages(&fx, "P2"), vec![Literal::integer(40)]);
    assert!(ages(&fx, "P3").is_empty());
}

#[test]
fn top_categories_are_declared_even_without_rows() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    let stats = convert_rows(
        Vec::<Result<SourceRow, IngestError>>::new(),
        RowSchema::ConditionEvent,
        &ctx,
        &mut fx.graph,
        RunSettings::default(),
        |_| {},
    )
    .expect("conversion");
    assert_eq!(stats.rows_read, 0);
    assert!(fx.graph.contains(&Assertion::sub_class_of(
        fx.class("Encounter"),
        fx.class("DomainConcept")
    )));
}

#[test]
fn row_with_conflicting_node_kinds_leaves_graph_untouched() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    // The gender cell names the encounter itself, so one node would be both
    // a class and an individual.
    let rows: Vec<Result<SourceRow, IngestError>> =
        vec![Ok(row(2, &["E1", "40", "E1", "Asian", "Flu"]))];
    let before = fx.graph.len();
    let stats = convert_rows(
        rows,
        RowSchema::PopulationDiagnosis,
        &ctx,
        &mut fx.graph,
        RunSettings::default(),
        |_| {},
    )
    .expect("conversion");
    assert_eq!(stats.rejections.get("node-kind-conflict"), Some(&1));
    assert_eq!(fx.graph.len(), before + stats.assertions_added);
    assert!(!fx.graph.contains(&Assertion::class_assertion(
        fx.class("Asian"),
        fx.individual("E1")
    )));
}

#[test]
fn progress_is_reported_every_interval() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    let rows = (0..7u64)
        .map(|i| Ok::<_, IngestError>(row(i + 2, &[format!("E{i}").as_str(), "250"])));
    let mut seen = Vec::new();
    let settings = RunSettings {
        progress_interval: 3,
        log_data: false,
    };
    convert_rows(
        rows,
        RowSchema::ConditionEvent,
        &ctx,
        &mut fx.graph,
        settings,
        |count| seen.push(count),
    )
    .expect("conversion");
    assert_eq!(seen, vec![3, 6]);
}

/// Yields nothing but an I/O error.
struct FailingSource;

impl std::io::Read for FailingSource {
    fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("device unplugged"))
    }
}

#[test]
fn read_failure_reports_rows_processed() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    let bytes: &[u8] = b"encounter,condition\nE1,250\nE2,401.9\n";
    let rows = RowReader::from_reader("broken.csv", std::io::Read::chain(bytes, FailingSource));
    let error = convert_rows(
        rows,
        RowSchema::ConditionEvent,
        &ctx,
        &mut fx.graph,
        RunSettings::default(),
        |_| {},
    )
    .expect_err("source failure is fatal");
    assert_eq!(error.rows_processed, 2);
    assert!(matches!(error.failure, ConversionFailure::Ingest(_)));
}

#[test]
fn undecodable_row_is_rejected_and_conversion_continues() {
    let mut fx = Fixture::new();
    let registry = fx.registry.clone();
    let ctx = ehr_core::ConversionContext::new(&registry, &fx.options).expect("context");
    let bytes: &[u8] = b"encounter,condition\nE1,250\nE2,\xFC\nE3,401.9\n";
    let rows = RowReader::from_reader("latin1.csv", bytes);

    let stats = convert_rows(
        rows,
        RowSchema::ConditionEvent,
        &ctx,
        &mut fx.graph,
        RunSettings::default(),
        |_| {},
    )
    .expect("conversion");

    assert_eq!(stats.rows_read, 3);
    assert_eq!(stats.rows_mapped, 2);
    assert_eq!(stats.rows_rejected(), 1);
}

#[test]
fn max_age_pass_ignores_non_numeric_values() {
    let mut fx = Fixture::new();
    let has_age = fx.property("hasAge");
    let subject = fx.individual("P9");
    fx.graph
        .extend([
            Assertion::data_property(has_age.clone(), subject.clone(), Literal::integer(70)),
            Assertion::data_property(has_age.clone(), subject.clone(), Literal::integer(85)),
            Assertion::data_property(has_age.clone(), subject, Literal::string("unknown")),
        ])
        .expect("extend");
    assert_eq!(reconcile_max_age(&mut fx.graph, &has_age), 1);
    let mut remaining = ages(&fx, "P9");
    remaining.sort();
    assert_eq!(
        remaining,
        vec![Literal::integer(85), Literal::string("unknown")]
    );
}
