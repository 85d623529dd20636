//! Tests for the assertion accumulator.

use ehr_model::{
    Annotation, Assertion, ClassExpression, ConversionOptions, Graph, GraphError, Iri, Literal,
    NodeKind, Vocabulary,
};
use proptest::prelude::*;

fn vocab() -> Vocabulary {
    Vocabulary::new(&ConversionOptions::default())
}

fn empty_graph() -> Graph {
    Graph::new(Iri::new("http://example.org/run").unwrap())
}

#[test]
fn duplicate_assertions_collapse() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let class = vocab.class("Female").unwrap();
    let enc = vocab.individual("e1").unwrap();

    assert!(graph
        .insert(Assertion::class_assertion(class.clone(), enc.clone()))
        .unwrap());
    assert!(!graph
        .insert(Assertion::class_assertion(class, enc))
        .unwrap());
    assert_eq!(graph.len(), 1);
}

#[test]
fn annotations_are_part_of_identity() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let plain = Assertion::object_property(
        vocab.property("orderedLab").unwrap(),
        vocab.individual("e1").unwrap(),
        vocab.individual("lab1").unwrap(),
    );
    let dated = plain
        .clone()
        .with_annotations(vocab.date_annotations(2015, 3, 1).unwrap());

    graph.insert(plain).unwrap();
    graph.insert(dated.clone()).unwrap();
    graph.insert(dated).unwrap();
    assert_eq!(graph.len(), 2);
}

#[test]
fn node_kind_is_fixed_on_first_use() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let class = vocab.class("250").unwrap();
    graph
        .insert(Assertion::class_assertion(
            class.clone(),
            vocab.individual("e1").unwrap(),
        ))
        .unwrap();

    let reused = vocab.individual("250").unwrap();
    let error = graph
        .insert(Assertion::data_property(
            vocab.property("hasAge").unwrap(),
            reused,
            Literal::integer(40),
        ))
        .unwrap_err();
    assert_eq!(
        error,
        GraphError::NodeKindConflict {
            iri: class.iri().clone(),
            existing: NodeKind::Class,
            requested: NodeKind::Individual,
        }
    );
    assert_eq!(graph.len(), 1);
}

#[test]
fn failed_batch_leaves_graph_unchanged() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let batch = vec![
        Assertion::class_assertion(vocab.class("Male").unwrap(), vocab.individual("e2").unwrap()),
        Assertion::sub_class_of(vocab.class("e2").unwrap(), vocab.class("Patient").unwrap()),
    ];
    assert!(graph.extend(batch).is_err());
    assert!(graph.is_empty());
    assert_eq!(graph.node_kind(vocab.individual("e2").unwrap().iri()), None);
}

#[test]
fn constraint_nodes_are_kind_checked() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let drug = vocab.individual("d1").unwrap();
    let constraint = Assertion::unsatisfiable(ClassExpression::intersection([
        ClassExpression::has_value(vocab.property("indicatedDrug").unwrap(), drug.clone()),
        ClassExpression::has_value(vocab.property("contraindicatedDrug").unwrap(), drug),
    ]));
    graph.insert(constraint).unwrap();
    assert!(graph
        .insert(Assertion::sub_class_of(
            vocab.class("d1").unwrap(),
            vocab.class("Drug").unwrap()
        ))
        .is_err());
}

#[test]
fn class_definitions_declare_their_fillers_as_classes() {
    let vocab = vocab();
    let mut graph = empty_graph();
    let patient = vocab.class("Patient-250").unwrap();
    let definition = ClassExpression::intersection([
        ClassExpression::named(vocab.class("Patient").unwrap()),
        ClassExpression::some_values_from(
            vocab.property("hasCondition").unwrap(),
            ClassExpression::named(vocab.class("250").unwrap()),
        ),
    ]);
    graph
        .insert(Assertion::equivalent_class(patient.clone(), definition))
        .unwrap();
    assert_eq!(
        graph.node_kind(vocab.class("250").unwrap().iri()),
        Some(NodeKind::Class)
    );
    assert!(graph
        .insert(Assertion::class_assertion(
            vocab.class("Disease").unwrap(),
            vocab.individual("250").unwrap(),
        ))
        .is_err());

    let json = serde_json::to_value(Assertion::sub_class_of_expression(
        patient,
        ClassExpression::all_values_from(
            vocab.property("hasCondition").unwrap(),
            ClassExpression::named(vocab.class("Disease").unwrap()),
        ),
    ))
    .unwrap();
    assert_eq!(json["fact"]["kind"], "sub_class_of_expression");
    assert_eq!(json["fact"]["sup"]["expr"], "all_values_from");
    assert_eq!(json["fact"]["sup"]["filler"]["expr"], "named");
}

#[test]
fn assertion_serializes_with_tagged_fact() {
    let vocab = vocab();
    let assertion = Assertion::object_property(
        vocab.property("prescribedDrug").unwrap(),
        vocab.individual("e1").unwrap(),
        vocab.individual("d1").unwrap(),
    )
    .with_annotations([Annotation::new(
        vocab.property("year").unwrap(),
        Literal::integer(2015),
    )]);
    let json = serde_json::to_value(&assertion).unwrap();
    assert_eq!(json["fact"]["kind"], "object_property");
    assert_eq!(json["annotations"][0]["value"]["lexical"], "2015");
    let back: Assertion = serde_json::from_value(json).unwrap();
    assert_eq!(back, assertion);
}

proptest! {
    #[test]
    fn inserting_twice_never_grows_the_graph(locals in prop::collection::vec("[a-z]{1,6}", 1..20)) {
        let vocab = vocab();
        let mut graph = empty_graph();
        let class = vocab.class("Encounter").unwrap();
        for local in &locals {
            let individual = vocab.individual(&format!("e{local}")).unwrap();
            graph.insert(Assertion::class_assertion(class.clone(), individual)).unwrap();
        }
        let size = graph.len();
        for local in &locals {
            let individual = vocab.individual(&format!("e{local}")).unwrap();
            prop_assert!(!graph.insert(Assertion::class_assertion(class.clone(), individual)).unwrap());
        }
        prop_assert_eq!(graph.len(), size);
    }
}
