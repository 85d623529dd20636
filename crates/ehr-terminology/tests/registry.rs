use std::fs;
use std::path::Path;

use ehr_model::{Assertion, ClassId, ConversionOptions, Graph, Iri};
use ehr_terminology::{
    TerminologyError, VocabularyRegistry, load_terminology, parse_terminology,
};

const ICD: &str = "http://purl.bioontology.org/ontology/ICD9CM/";

const EXPORT: &str = "\
Class ID,Preferred Label,Synonyms,Parents
http://purl.bioontology.org/ontology/ICD9CM/250,Diabetes mellitus,,http://www.w3.org/2002/07/owl#Thing
http://purl.bioontology.org/ontology/ICD9CM/250.1,Diabetes with ketoacidosis,,http://purl.bioontology.org/ontology/ICD9CM/250
http://purl.bioontology.org/ontology/ICD9CM/250.11,\"Diabetes with ketoacidosis, type I\",,http://purl.bioontology.org/ontology/ICD9CM/250.1|http://purl.bioontology.org/ontology/ICD9CM/250
http://purl.bioontology.org/ontology/ICD9CM/999,,,http://purl.bioontology.org/ontology/ICD9CM/250
";

fn icd(code: &str) -> ClassId {
    ClassId::parse(format!("{ICD}{code}")).unwrap()
}

fn loaded() -> (VocabularyRegistry, Graph) {
    let source = parse_terminology(Path::new("icd9.csv"), EXPORT.as_bytes()).expect("parse");
    let options = ConversionOptions::default();
    let mut registry = VocabularyRegistry::new(&options);
    let mut graph = Graph::new(Iri::new(options.namespace.clone()).unwrap());
    registry
        .load_code_hierarchy(&source, &mut graph)
        .expect("load hierarchy");
    (registry, graph)
}

#[test]
fn copies_hierarchy_without_root_links() {
    let (_, graph) = loaded();
    assert!(graph.contains(&Assertion::sub_class_of(icd("250.1"), icd("250"))));
    assert!(graph.contains(&Assertion::sub_class_of(icd("250.11"), icd("250.1"))));
    assert!(graph.contains(&Assertion::sub_class_of(icd("250.11"), icd("250"))));
    assert!(graph.contains(&Assertion::sub_class_of(icd("999"), icd("250"))));
    assert!(graph.iter().all(|a| !format!("{a:?}").contains("owl#Thing")));
}

#[test]
fn resolves_only_labeled_codes() {
    let (registry, graph) = loaded();
    assert_eq!(registry.resolve_code("250.1"), Some(&icd("250.1")));
    assert_eq!(registry.resolve_code("999"), None);
    assert_eq!(registry.resolve_code("401"), None);
    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.label(&icd("250.11")),
        Some("Diabetes with ketoacidosis, type I")
    );
    let class_250 = icd("250");
    let labels: Vec<_> = graph.labels(class_250.iri()).collect();
    assert_eq!(labels, vec!["Diabetes mellitus"]);
}

#[test]
fn repeated_resolution_yields_identical_class() {
    let (registry, _) = loaded();
    let first = registry.resolve_code("250").cloned();
    let second = registry.resolve_code("250").cloned();
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(registry.class_id("Drug").unwrap(), registry.class_id("Drug").unwrap());
}

#[test]
fn missing_class_column_is_fatal() {
    let error = parse_terminology(Path::new("bad.csv"), b"Label,Parents\nx,y\n").unwrap_err();
    assert!(matches!(
        error,
        TerminologyError::MissingColumn { column: "Class ID", .. }
    ));
}

#[test]
fn unreadable_file_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("icd9.csv");
    assert!(matches!(
        load_terminology(&path),
        Err(TerminologyError::Io { .. })
    ));
    fs::write(&path, EXPORT).expect("write export");
    assert_eq!(load_terminology(&path).expect("load").len(), 4);
}

#[test]
fn root_classes_are_those_directly_under_the_universal_root() {
    let (registry, _) = loaded();
    assert_eq!(
        registry.root_classes().iter().collect::<Vec<_>>(),
        vec![&icd("250")]
    );
}
