//! The assertion accumulator.

use std::collections::{BTreeMap, BTreeSet};

use crate::assertion::{Assertion, Fact};
use crate::error::{GraphError, Result};
use crate::ids::{ClassId, IndividualId, Iri, NodeKind, PropertyId};

/// Append-only, deduplicating set of assertions owned by one run.
///
/// Node kinds are fixed the first time an identifier is used; any later use
/// as the other kind is rejected and leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    iri: Iri,
    assertions: BTreeSet<Assertion>,
    kinds: BTreeMap<Iri, NodeKind>,
}

impl Graph {
    pub fn new(iri: Iri) -> Self {
        Self {
            iri,
            assertions: BTreeSet::new(),
            kinds: BTreeMap::new(),
        }
    }

    pub fn from_assertions(
        iri: Iri,
        assertions: impl IntoIterator<Item = Assertion>,
    ) -> Result<Self> {
        let mut graph = Self::new(iri);
        graph.extend(assertions)?;
        Ok(graph)
    }

    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    pub fn contains(&self, assertion: &Assertion) -> bool {
        self.assertions.contains(assertion)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter()
    }

    pub fn node_kind(&self, iri: &Iri) -> Option<NodeKind> {
        self.kinds.get(iri).copied()
    }

    /// Adds one assertion. Returns `Ok(false)` when it was already present.
    pub fn insert(&mut self, assertion: Assertion) -> Result<bool> {
        for (iri, kind) in assertion.fact.nodes() {
            self.check_kind(iri, kind, None)?;
        }
        self.record_kinds(&assertion);
        Ok(self.assertions.insert(assertion))
    }

    /// Adds a batch atomically: either every assertion is accepted or none
    /// is. Returns the number of assertions that were new.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = Assertion>) -> Result<usize> {
        let batch: Vec<Assertion> = batch.into_iter().collect();
        let mut pending: BTreeMap<&Iri, NodeKind> = BTreeMap::new();
        for assertion in &batch {
            for (iri, kind) in assertion.fact.nodes() {
                self.check_kind(iri, kind, pending.get(iri).copied())?;
                pending.insert(iri, kind);
            }
        }
        let mut added = 0;
        for assertion in batch {
            self.record_kinds(&assertion);
            if self.assertions.insert(assertion) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Removes an assertion. Node kinds stay fixed for the rest of the run.
    pub fn remove(&mut self, assertion: &Assertion) -> bool {
        self.assertions.remove(assertion)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Assertion) -> bool) {
        self.assertions.retain(|assertion| keep(assertion));
    }

    /// Individuals asserted to be members of `class`.
    pub fn members_of(&self, class: &ClassId) -> BTreeSet<IndividualId> {
        self.assertions
            .iter()
            .filter_map(|assertion| match &assertion.fact {
                Fact::ClassAssertion {
                    class: asserted,
                    individual,
                } if asserted == class => Some(individual.clone()),
                _ => None,
            })
            .collect()
    }

    /// Assertions whose fact is a data property assertion on `property`.
    pub fn data_assertions<'a>(
        &'a self,
        property: &'a PropertyId,
    ) -> impl Iterator<Item = &'a Assertion> + 'a {
        self.assertions.iter().filter(move |assertion| {
            matches!(&assertion.fact, Fact::DataProperty { property: p, .. } if p == property)
        })
    }

    /// Label values attached to `subject`.
    pub fn labels<'a>(&'a self, subject: &'a Iri) -> impl Iterator<Item = &'a str> + 'a {
        self.assertions
            .iter()
            .filter_map(move |assertion| match &assertion.fact {
                Fact::Label { subject: s, value } if s == subject => {
                    Some(value.lexical.as_str())
                }
                _ => None,
            })
    }

    fn check_kind(&self, iri: &Iri, kind: NodeKind, pending: Option<NodeKind>) -> Result<()> {
        let existing = self.kinds.get(iri).copied().or(pending);
        match existing {
            Some(existing) if existing != kind => Err(GraphError::NodeKindConflict {
                iri: iri.clone(),
                existing,
                requested: kind,
            }),
            _ => Ok(()),
        }
    }

    fn record_kinds(&mut self, assertion: &Assertion) {
        for (iri, kind) in assertion.fact.nodes() {
            self.kinds.entry(iri.clone()).or_insert(kind);
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Assertion;
    type IntoIter = std::collections::btree_set::Iter<'a, Assertion>;

    fn into_iter(self) -> Self::IntoIter {
        self.assertions.iter()
    }
}
