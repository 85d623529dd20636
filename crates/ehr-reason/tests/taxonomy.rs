use std::collections::BTreeSet;
use std::time::Duration;

use ehr_model::{Assertion, ClassExpression, ClassId, Graph, IndividualId, Iri, PropertyId};
use ehr_reason::{ClassificationRequest, Classifier, ReasonerError, TaxonomyClassifier};
use proptest::prelude::*;

const NS: &str = "http://example.org/ehr#";

fn class(name: &str) -> ClassId {
    ClassId::parse(format!("{NS}{name}")).unwrap()
}

fn individual(name: &str) -> IndividualId {
    IndividualId::parse(format!("{NS}{name}")).unwrap()
}

fn property(name: &str) -> PropertyId {
    PropertyId::parse(format!("{NS}{name}")).unwrap()
}

fn graph(assertions: impl IntoIterator<Item = Assertion>) -> Graph {
    Graph::from_assertions(Iri::new("http://example.org/ehr").unwrap(), assertions).unwrap()
}

fn collision_constraint(drug: &str) -> Assertion {
    Assertion::unsatisfiable(ClassExpression::intersection([
        ClassExpression::has_value(property("indicatedDrug"), individual(drug)),
        ClassExpression::has_value(property("contraindicatedDrug"), individual(drug)),
    ]))
}

#[test]
fn told_hierarchy_is_closed_transitively() {
    let g = graph([
        Assertion::sub_class_of(class("250.1"), class("250")),
        Assertion::sub_class_of(class("250.11"), class("250.1")),
        Assertion::sub_class_of(class("401"), class("Disease")),
    ]);
    let classification = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g))
        .unwrap();
    assert_eq!(
        classification.subclasses_of(&class("250"), false),
        BTreeSet::from([class("250.1"), class("250.11")])
    );
    assert_eq!(
        classification.subclasses_of(&class("250"), true),
        BTreeSet::from([class("250.1")])
    );
    assert!(classification.is_consistent());
}

#[test]
fn constraint_without_instances_is_consistent() {
    let g = graph([
        collision_constraint("D1"),
        Assertion::object_property(property("indicatedDrug"), individual("P1"), individual("D1")),
        Assertion::object_property(
            property("contraindicatedDrug"),
            individual("P2"),
            individual("D1"),
        ),
    ]);
    let classification = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g))
        .unwrap();
    assert!(classification.is_consistent());
}

#[test]
fn subject_linked_both_ways_is_a_violation() {
    let g = graph([
        collision_constraint("D1"),
        Assertion::object_property(property("indicatedDrug"), individual("P1"), individual("D1")),
        Assertion::object_property(
            property("contraindicatedDrug"),
            individual("P1"),
            individual("D1"),
        ),
    ]);
    let classification = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g))
        .unwrap();
    assert!(!classification.is_consistent());
    assert_eq!(
        classification.violations()[0].individuals,
        BTreeSet::from([individual("P1")])
    );
    assert_eq!(
        classification.ensure_consistent(),
        Err(ReasonerError::Inconsistent { violations: 1 })
    );
}

#[test]
fn named_operand_matches_members_of_subclasses() {
    let g = graph([
        Assertion::sub_class_of(class("Pregnant"), class("Female")),
        Assertion::class_assertion(class("Pregnant"), individual("P1")),
        Assertion::object_property(property("prescribed"), individual("P1"), individual("D9")),
        Assertion::unsatisfiable(ClassExpression::intersection([
            ClassExpression::named(class("Female")),
            ClassExpression::has_value(property("prescribed"), individual("D9")),
        ])),
    ]);
    let classification = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g))
        .unwrap();
    assert_eq!(classification.violations().len(), 1);
}

#[test]
fn quantified_operands_follow_property_links() {
    let some_high_risk = ClassExpression::some_values_from(
        property("prescribed"),
        ClassExpression::named(class("HighRisk")),
    );
    let only_high_risk = ClassExpression::intersection([
        ClassExpression::has_value(property("prescribed"), individual("D1")),
        ClassExpression::all_values_from(
            property("prescribed"),
            ClassExpression::named(class("HighRisk")),
        ),
    ]);
    let g = graph([
        Assertion::class_assertion(class("HighRisk"), individual("D1")),
        Assertion::object_property(property("prescribed"), individual("P1"), individual("D1")),
        Assertion::object_property(property("prescribed"), individual("P2"), individual("D1")),
        Assertion::object_property(property("prescribed"), individual("P2"), individual("D2")),
        Assertion::unsatisfiable(some_high_risk.clone()),
        Assertion::unsatisfiable(only_high_risk.clone()),
    ]);
    let classification = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g))
        .unwrap();
    let instances = |expression: &ClassExpression| {
        classification
            .violations()
            .iter()
            .find(|violation| &violation.expression == expression)
            .map(|violation| violation.individuals.clone())
    };
    assert_eq!(
        instances(&some_high_risk),
        Some(BTreeSet::from([individual("P1"), individual("P2")]))
    );
    assert_eq!(
        instances(&only_high_risk),
        Some(BTreeSet::from([individual("P1")]))
    );
}

#[test]
fn zero_timeout_is_reported_as_timeout() {
    let g = graph([Assertion::sub_class_of(class("A"), class("B"))]);
    let outcome = TaxonomyClassifier::new()
        .classify(ClassificationRequest::new(&g).with_timeout(Duration::ZERO));
    assert_eq!(
        outcome,
        Err(ReasonerError::Timeout {
            limit: Duration::ZERO
        })
    );
}

proptest! {
    #[test]
    fn transitive_subclasses_include_direct_ones(edges in prop::collection::vec((0u8..8, 0u8..8), 0..20)) {
        let g = graph(edges.iter().map(|(sub, sup)| {
            Assertion::sub_class_of(class(&format!("C{sub}")), class(&format!("C{sup}")))
        }));
        let classification = TaxonomyClassifier::new()
            .classify(ClassificationRequest::new(&g))
            .unwrap();
        for node in 0u8..8 {
            let id = class(&format!("C{node}"));
            let direct = classification.subclasses_of(&id, true);
            let all = classification.subclasses_of(&id, false);
            prop_assert!(direct.iter().all(|c| c == &id || all.contains(c)));
            prop_assert!(!all.contains(&id));
        }
    }
}
