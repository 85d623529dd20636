use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use ehr_model::{
    Assertion, ClassExpression, ClassId, ConversionOptions, Fact, Graph, IndividualId, Iri,
    Literal, SamplingOptions,
};
use ehr_safety::{
    NoClosure, Plausibility, Provenance, SafetyError, SafetyRecords, SafetySources, Severity,
    Table, build_patient_classes, build_safety_graph, detect_inconsistencies, expand_conditions,
};
use ehr_terminology::{VocabularyRegistry, parse_terminology};
use ehr_transform::CellNormalizer;
use proptest::prelude::*;

const ICD: &str = "http://purl.bioontology.org/ontology/ICD9CM/";

const TERMINOLOGY: &str = "\
Class ID,Preferred Label,Parents
http://purl.bioontology.org/ontology/ICD9CM/250,Diabetes mellitus,http://www.w3.org/2002/07/owl#Thing
http://purl.bioontology.org/ontology/ICD9CM/250.1,Diabetes with ketoacidosis,http://purl.bioontology.org/ontology/ICD9CM/250
http://purl.bioontology.org/ontology/ICD9CM/401.9,Hypertension,http://www.w3.org/2002/07/owl#Thing
";

const CONTRAINDICATIONS: &str = "\
id,drug,name,condition,a,b,c,severity
1,D1,Metformin,C-DM,,,,Moderate
2,D1,Metformin,C-HTN,,,,High
3,D2,Lisinopril,C-HTN,,,,unclear
4,D3,Unmapped,C-NONE,,,,Minimal
";

const CONDITIONS: &str = "\
code,label,condition
250,diabetes,C-DM
401.9,hypertension,C-HTN
";

const CATEGORIES: &str = "\
drug,a,b,category
D1,,,Biguanide
D9,,,Unused
";

const INDICATIONS: &str = "\
drug,name,condition
D1,Metformin,C-DM
D4,Aspirin,C-HTN
";

const ORDERS: &str = "\
drug,form,dose,quantity,route,frequency,duration
D1,tablet,500mg,,oral,twice daily,
D1,syrup,,,,,
";

struct Sources {
    contraindications: Table,
    conditions: Table,
    categories: Table,
    indications: Table,
    orders: Table,
}

impl Sources {
    fn new() -> Self {
        Self {
            contraindications: table("contraindications.csv", CONTRAINDICATIONS),
            conditions: table("conditions.csv", CONDITIONS),
            categories: table("categories.csv", CATEGORIES),
            indications: table("indications.csv", INDICATIONS),
            orders: table("orders.csv", ORDERS),
        }
    }

    fn view(&self) -> SafetySources<'_> {
        SafetySources {
            contraindications: &self.contraindications,
            conditions: &self.conditions,
            categories: &self.categories,
            indications: Some(&self.indications),
            order_details: Some(&self.orders),
        }
    }

    fn records(&self) -> SafetyRecords {
        SafetyRecords::build(
            &self.view(),
            &SamplingOptions::default(),
            &CellNormalizer::default(),
        )
        .expect("records")
    }
}

fn table(label: &str, text: &str) -> Table {
    Table::from_bytes(label, text.as_bytes()).expect("table")
}

fn icd(code: &str) -> ClassId {
    ClassId::parse(format!("{ICD}{code}")).expect("icd class")
}

fn registry() -> VocabularyRegistry {
    let options = ConversionOptions::default();
    let source =
        parse_terminology(Path::new("icd9.csv"), TERMINOLOGY.as_bytes()).expect("terminology");
    let mut registry = VocabularyRegistry::new(&options);
    let mut scratch = Graph::new(Iri::new(options.namespace.clone()).expect("iri"));
    registry
        .load_code_hierarchy(&source, &mut scratch)
        .expect("hierarchy");
    registry
}

fn empty_graph() -> Graph {
    Graph::new(Iri::new(ConversionOptions::default().namespace).expect("iri"))
}

fn individual(registry: &VocabularyRegistry, local: &str) -> IndividualId {
    registry.individual_id(local).expect("individual")
}

#[test]
fn contraindication_rows_merge_per_drug() {
    let records = Sources::new().records();
    let d1 = &records.contraindications["D1"];
    assert_eq!(d1.drug_name, "Metformin");
    assert_eq!(
        d1.conditions,
        BTreeSet::from(["250".to_string(), "401.9".to_string()])
    );
    assert_eq!(d1.severity, Some(Severity::Known(Plausibility::High)));
    assert_eq!(d1.category.as_deref(), Some("Biguanide"));

    let d2 = &records.contraindications["D2"];
    assert_eq!(d2.severity, Some(Severity::Unrecognized("unclear".to_string())));
    assert_eq!(d2.category, None);

    // A condition missing from the condition map contributes nothing, but
    // the drug is still known.
    assert!(records.contraindications["D3"].conditions.is_empty());
}

#[test]
fn indications_carry_the_first_order_descriptor() {
    let records = Sources::new().records();
    assert_eq!(
        records.indications["D1"].order.as_deref(),
        Some("tablet, 500mg, oral, twice daily")
    );
    assert_eq!(records.indications["D4"].order, None);
    assert_eq!(records.indications["D1"].category.as_deref(), Some("Biguanide"));
}

#[test]
fn indications_are_optional() {
    let sources = Sources::new();
    let view = SafetySources {
        indications: None,
        order_details: None,
        ..sources.view()
    };
    let records = SafetyRecords::build(
        &view,
        &SamplingOptions::default(),
        &CellNormalizer::default(),
    )
    .expect("records");
    assert!(records.indications.is_empty());
    assert_eq!(records.contraindications.len(), 3);
}

#[test]
fn zero_scale_factor_drops_every_indication() {
    let sources = Sources::new();
    let sampling = SamplingOptions {
        scale_factor: 0.0,
        seed: Some(7),
    };
    let records = SafetyRecords::build(&sources.view(), &sampling, &CellNormalizer::default())
        .expect("records");
    assert!(records.indications.is_empty());
    assert_eq!(records.contraindications.len(), 3);
}

#[test]
fn seeded_sampling_is_reproducible() {
    let many: String = std::iter::once("drug,name,condition\n".to_string())
        .chain((0..200).map(|i| format!("D{i},Drug {i},C-DM\n")))
        .collect();
    let sources = Sources::new();
    let indications = table("indications.csv", &many);
    let view = SafetySources {
        indications: Some(&indications),
        ..sources.view()
    };
    let sampling = SamplingOptions {
        scale_factor: 0.5,
        seed: Some(42),
    };
    let normalizer = CellNormalizer::default();
    let first = SafetyRecords::build(&view, &sampling, &normalizer).expect("records");
    let second = SafetyRecords::build(&view, &sampling, &normalizer).expect("records");
    assert_eq!(first.indications, second.indications);
    assert!(first.indications.len() < 200);
}

#[test]
fn scale_factor_out_of_range_is_rejected() {
    let sources = Sources::new();
    let sampling = SamplingOptions {
        scale_factor: 1.5,
        seed: None,
    };
    let error = SafetyRecords::build(&sources.view(), &sampling, &CellNormalizer::default())
        .expect_err("invalid scale factor");
    assert!(matches!(error, SafetyError::Config(_)));
}

#[test]
fn short_reference_row_is_fatal() {
    let sources = Sources::new();
    let short = table("contraindications.csv", "id,drug,name\n1,D1,Metformin\n");
    let view = SafetySources {
        contraindications: &short,
        ..sources.view()
    };
    let error = SafetyRecords::build(&view, &SamplingOptions::default(), &CellNormalizer::default())
        .expect_err("short row");
    assert!(matches!(
        error,
        SafetyError::MissingColumn { line: 2, column: 3, .. }
    ));
}

#[test]
fn table_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CONDITIONS.as_bytes()).expect("write");
    let loaded = Table::load(file.path()).expect("load");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.path(), file.path());
}

#[test]
fn safety_graph_marks_given_and_inferred_conditions() {
    let registry = registry();
    let records = Sources::new().records();
    let closure = BTreeMap::from([(icd("250"), BTreeSet::from([icd("250.1")]))]);
    let mut graph = empty_graph();

    let report = build_safety_graph(&records, &registry, &closure, &mut graph).expect("graph");

    let vocab = registry.vocabulary();
    let given = vocab.class("GivenContraindication").expect("class");
    let inferred = vocab.class("InferredContraindication").expect("class");
    let given_fact = individual(&registry, "contraindication-250-D1");
    let inferred_fact = individual(&registry, "contraindication-250.1-D1");
    assert!(graph.contains(&Assertion::class_assertion(given.clone(), given_fact.clone())));
    assert!(graph.contains(&Assertion::class_assertion(inferred, inferred_fact.clone())));
    assert!(graph.contains(&Assertion::class_assertion(
        vocab.class("High").expect("class"),
        given_fact.clone()
    )));
    assert!(graph.contains(&Assertion::data_property(
        vocab.property("plausibility").expect("property"),
        given_fact.clone(),
        Literal::string("High")
    )));
    assert!(graph.contains(&Assertion::object_property(
        vocab.property("drug").expect("property"),
        inferred_fact,
        individual(&registry, "D1")
    )));
    assert!(
        graph
            .labels(individual(&registry, "250.1").iri())
            .any(|label| label == "Diabetes with ketoacidosis")
    );
    assert!(graph.contains(&Assertion::sub_class_of(
        vocab.class("Biguanide").expect("class"),
        vocab.class("Drug").expect("class")
    )));

    let contra = report.contraindications;
    assert_eq!(contra.drugs, 3);
    // D1: 250, 250.1 (inferred), 401.9; D2: 401.9.
    assert_eq!(contra.facts_asserted, 3);
    assert_eq!(contra.facts_inferred, 1);
    assert_eq!(contra.conditions_asserted, 2);
    assert_eq!(contra.conditions_total, 3);
    assert_eq!(contra.conditions_inferred(), 1);
    assert_eq!(report.indications.drugs, 2);
    assert_eq!(report.assertions_added, graph.len());
}

#[test]
fn unrecognized_severity_keeps_text_without_level_class() {
    let registry = registry();
    let records = Sources::new().records();
    let mut graph = empty_graph();
    build_safety_graph(&records, &registry, &NoClosure, &mut graph).expect("graph");

    let fact = individual(&registry, "contraindication-401.9-D2");
    let vocab = registry.vocabulary();
    assert!(graph.contains(&Assertion::data_property(
        vocab.property("plausibility").expect("property"),
        fact.clone(),
        Literal::string("unclear")
    )));
    let typed_with_level = graph.iter().any(|assertion| match &assertion.fact {
        Fact::ClassAssertion { class, individual } => {
            individual == &fact && ["Low", "Medium", "High"].contains(&class.short_form())
        }
        _ => false,
    });
    assert!(!typed_with_level);
}

#[test]
fn plausibility_chain_is_declared() {
    let registry = registry();
    let mut graph = empty_graph();
    build_safety_graph(&SafetyRecords::default(), &registry, &NoClosure, &mut graph)
        .expect("graph");
    let vocab = registry.vocabulary();
    for (sub, sup) in Plausibility::chain() {
        assert!(graph.contains(&Assertion::sub_class_of(
            vocab.class(sub).expect("class"),
            vocab.class(sup).expect("class")
        )));
    }
}

#[test]
fn drug_on_both_sides_yields_one_constraint() {
    let registry = registry();
    let records = Sources::new().records();
    let vocab = registry.vocabulary();
    let constraints = detect_inconsistencies(&records, vocab).expect("constraints");
    let expected = Assertion::unsatisfiable(ClassExpression::intersection([
        ClassExpression::has_value(
            vocab.property("indicatedDrug").expect("property"),
            individual(&registry, "D1"),
        ),
        ClassExpression::has_value(
            vocab.property("contraindicatedDrug").expect("property"),
            individual(&registry, "D1"),
        ),
    ]));
    assert_eq!(constraints, vec![expected]);
}

#[test]
fn unresolved_condition_codes_are_counted() {
    let registry = registry();
    let sources = Sources::new();
    let conditions = table("conditions.csv", "code,label,condition\n999.9,missing,C-DM\n");
    let view = SafetySources {
        conditions: &conditions,
        indications: None,
        ..sources.view()
    };
    let records = SafetyRecords::build(&view, &SamplingOptions::default(), &CellNormalizer::default())
        .expect("records");
    let mut graph = empty_graph();
    let report = build_safety_graph(&records, &registry, &NoClosure, &mut graph).expect("graph");
    assert_eq!(report.contraindications.unresolved_codes, 1);
    assert_eq!(report.contraindications.facts_asserted, 0);
}

#[test]
fn conflicting_drug_record_does_not_discard_the_others() {
    let registry = registry();
    let sources = Sources::new();
    let contraindications = table(
        "contraindications.csv",
        "id,drug,name,condition,a,b,c,severity\n1,D1,Metformin,C-DM,,,,High\n2,D2,Lisinopril,C-HTN,,,,Moderate\n",
    );
    // D1's category is named like drug D2, so D2 cannot also be an individual.
    let categories = table("categories.csv", "drug,a,b,category\nD1,,,D2\n");
    let view = SafetySources {
        contraindications: &contraindications,
        categories: &categories,
        indications: None,
        order_details: None,
        ..sources.view()
    };
    let records = SafetyRecords::build(&view, &SamplingOptions::default(), &CellNormalizer::default())
        .expect("records");
    let mut graph = empty_graph();

    let report = build_safety_graph(&records, &registry, &NoClosure, &mut graph).expect("graph");

    assert_eq!(report.contraindications.drugs, 2);
    assert_eq!(report.contraindications.drugs_rejected, 1);
    assert_eq!(report.contraindications.facts_asserted, 1);
    assert_eq!(report.assertions_added, graph.len());
    let vocab = registry.vocabulary();
    assert!(graph.contains(&Assertion::class_assertion(
        vocab.class("D2").expect("class"),
        individual(&registry, "D1")
    )));
    assert!(graph.contains(&Assertion::class_assertion(
        vocab.class("GivenContraindication").expect("class"),
        individual(&registry, "contraindication-250-D1")
    )));
    let d2_facts = graph.iter().any(|assertion| match &assertion.fact {
        Fact::ClassAssertion { individual, .. } => individual.short_form().ends_with("-D2"),
        _ => false,
    });
    assert!(!d2_facts);
}

#[test]
fn patient_classes_define_conditions_and_imply_drugs() {
    let registry = registry();
    let records = Sources::new().records();
    let mut graph = empty_graph();

    let report =
        build_patient_classes(&records.contraindications, &registry, &mut graph).expect("model");

    assert_eq!(report.drugs, 3);
    assert_eq!(report.drugs_rejected, 0);
    assert_eq!(report.patient_classes, 2);
    // D1: 250 and 401.9; D2: 401.9.
    assert_eq!(report.implications, 3);
    assert_eq!(report.disease_roots, 2);
    assert_eq!(report.assertions_added, graph.len());

    let vocab = registry.vocabulary();
    let class = |local: &str| vocab.class(local).expect("class");
    let property = |local: &str| vocab.property(local).expect("property");
    let patient_250 = class("Patient-250");
    assert!(graph.contains(&Assertion::equivalent_class(
        patient_250.clone(),
        ClassExpression::intersection([
            ClassExpression::named(class("Patient")),
            ClassExpression::some_values_from(
                property("hasCondition"),
                ClassExpression::named(icd("250")),
            ),
        ])
    )));
    assert!(graph.contains(&Assertion::sub_class_of_expression(
        patient_250,
        ClassExpression::some_values_from(
            property("hasContraindicatedDrug"),
            ClassExpression::intersection([
                ClassExpression::named(class("D1")),
                ClassExpression::some_values_from(
                    property("hasContraindicationPlausibility"),
                    ClassExpression::named(class("High")),
                ),
            ]),
        )
    )));
    // Unrecognized severity: the drug without a plausibility qualifier.
    assert!(graph.contains(&Assertion::sub_class_of_expression(
        class("Patient-401.9"),
        ClassExpression::some_values_from(
            property("hasContraindicatedDrug"),
            ClassExpression::named(class("D2")),
        )
    )));
    assert!(graph.contains(&Assertion::sub_class_of(class("D1"), class("Biguanide"))));
    assert!(graph.contains(&Assertion::sub_class_of(icd("250"), class("Disease"))));
    assert!(graph.contains(&Assertion::sub_class_of_expression(
        class("Patient"),
        ClassExpression::all_values_from(
            property("hasCondition"),
            ClassExpression::named(class("Disease")),
        )
    )));
}

fn class_strategy() -> impl Strategy<Value = ClassId> {
    (0u8..12).prop_map(|n| icd(&format!("{n}")))
}

proptest! {
    #[test]
    fn expansion_is_a_superset_of_listed_conditions(
        listed in prop::collection::btree_set(class_strategy(), 0..5),
        edges in prop::collection::btree_map(
            class_strategy(),
            prop::collection::btree_set(class_strategy(), 0..4),
            0..8,
        ),
    ) {
        let expanded = expand_conditions(&listed, &edges);
        for class in &listed {
            prop_assert_eq!(expanded.get(class), Some(&Provenance::Asserted));
        }
        for (class, provenance) in &expanded {
            prop_assert_eq!(*provenance == Provenance::Asserted, listed.contains(class));
        }
    }
}
