//! Told-subsumption classifier.
//!
//! Computes the sub-class closure from asserted sub-class facts only and
//! checks every unsatisfiable constraint against the asserted class and
//! object property facts. It does no description-logic inference beyond
//! that.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use ehr_model::{ClassExpression, ClassId, Fact, Graph, IndividualId, PropertyId};
use tracing::{debug, info, warn};

use crate::classification::{Classification, ClassificationRequest, Classifier, Violation};
use crate::error::ReasonerError;

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomyClassifier;

impl TaxonomyClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for TaxonomyClassifier {
    fn classify(&self, request: ClassificationRequest<'_>) -> Result<Classification, ReasonerError> {
        let started = Instant::now();
        let deadline = Deadline {
            started,
            limit: request.timeout,
        };
        deadline.check()?;

        let graph = request.graph;
        let hierarchy = Classification::from_hierarchy(graph.iter().filter_map(|assertion| {
            match &assertion.fact {
                Fact::SubClassOf { sub, sup } => Some((sub.clone(), sup.clone())),
                _ => None,
            }
        }));
        deadline.check()?;

        let facts = AssertedFacts::collect(graph);
        let mut violations = Vec::new();
        for assertion in graph {
            let Fact::Unsatisfiable { expression } = &assertion.fact else {
                continue;
            };
            deadline.check()?;
            let individuals: BTreeSet<IndividualId> = facts
                .individuals()
                .filter(|individual| facts.satisfies(individual, expression, &hierarchy))
                .cloned()
                .collect();
            if !individuals.is_empty() {
                debug!(
                    instances = individuals.len(),
                    "unsatisfiable constraint has instances"
                );
                violations.push(Violation {
                    expression: expression.clone(),
                    individuals,
                });
            }
        }

        if !violations.is_empty() {
            warn!(violations = violations.len(), "graph is inconsistent");
        }
        info!(
            duration_ms = started.elapsed().as_millis(),
            consistent = violations.is_empty(),
            "classification finished"
        );
        let (children, _) = hierarchy.into_parts();
        Ok(Classification::new(children, violations))
    }
}

struct Deadline {
    started: Instant,
    limit: Option<std::time::Duration>,
}

impl Deadline {
    fn check(&self) -> Result<(), ReasonerError> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => Err(ReasonerError::Timeout { limit }),
            _ => Ok(()),
        }
    }
}

/// Class memberships and object property links as asserted.
struct AssertedFacts<'g> {
    types: BTreeMap<&'g IndividualId, BTreeSet<&'g ClassId>>,
    links: BTreeSet<(&'g PropertyId, &'g IndividualId, &'g IndividualId)>,
}

impl<'g> AssertedFacts<'g> {
    fn collect(graph: &'g Graph) -> Self {
        let mut types: BTreeMap<&IndividualId, BTreeSet<&ClassId>> = BTreeMap::new();
        let mut links = BTreeSet::new();
        for assertion in graph {
            match &assertion.fact {
                Fact::ClassAssertion { class, individual } => {
                    types.entry(individual).or_default().insert(class);
                }
                Fact::ObjectProperty {
                    property,
                    subject,
                    object,
                } => {
                    types.entry(subject).or_default();
                    links.insert((property, subject, object));
                }
                _ => {}
            }
        }
        Self { types, links }
    }

    fn individuals(&self) -> impl Iterator<Item = &'g IndividualId> + '_ {
        self.types.keys().copied()
    }

    fn satisfies(
        &self,
        individual: &IndividualId,
        expression: &ClassExpression,
        hierarchy: &Classification,
    ) -> bool {
        match expression {
            ClassExpression::Named { class } => {
                let Some(asserted) = self.types.get(individual) else {
                    return false;
                };
                asserted.contains(class)
                    || hierarchy
                        .subclasses_of(class, false)
                        .iter()
                        .any(|sub| asserted.contains(sub))
            }
            ClassExpression::HasValue {
                property,
                individual: value,
            } => self.links.contains(&(property, individual, value)),
            ClassExpression::Intersection { operands } => operands
                .iter()
                .all(|operand| self.satisfies(individual, operand, hierarchy)),
            ClassExpression::SomeValuesFrom { property, filler } => self
                .objects(property, individual)
                .any(|object| self.satisfies(object, filler, hierarchy)),
            ClassExpression::AllValuesFrom { property, filler } => self
                .objects(property, individual)
                .all(|object| self.satisfies(object, filler, hierarchy)),
        }
    }

    /// Objects linked from `subject` through `property`.
    fn objects<'s>(
        &'s self,
        property: &'s PropertyId,
        subject: &'s IndividualId,
    ) -> impl Iterator<Item = &'g IndividualId> + 's {
        self.links
            .iter()
            .filter(move |(p, s, _)| *p == property && *s == subject)
            .map(|(_, _, object)| *object)
    }
}
