//! Post-pass over a finished graph: one age per subject.

use std::collections::BTreeMap;

use ehr_model::{Assertion, Fact, Graph, IndividualId, PropertyId};
use tracing::debug;

/// Keeps only the greatest `property` value for every subject that has more
/// than one, removing the rest. Returns how many assertions were removed.
///
/// Non-numeric values are neither compared nor removed. Among equal maxima
/// the first in graph order is kept.
pub fn reconcile_max_age(graph: &mut Graph, property: &PropertyId) -> usize {
    let mut by_subject: BTreeMap<&IndividualId, Vec<(&Assertion, f64)>> = BTreeMap::new();
    for assertion in graph.data_assertions(property) {
        if let Fact::DataProperty { subject, value, .. } = &assertion.fact
            && let Some(number) = value.as_f64()
        {
            by_subject
                .entry(subject)
                .or_default()
                .push((assertion, number));
        }
    }

    let mut stale: Vec<Assertion> = Vec::new();
    for (subject, facts) in by_subject {
        if facts.len() < 2 {
            continue;
        }
        let mut keep = 0;
        for (index, (_, number)) in facts.iter().enumerate() {
            if *number > facts[keep].1 {
                keep = index;
            }
        }
        debug!(
            subject = subject.short_form(),
            kept = facts[keep].1,
            dropped = facts.len() - 1,
            "age facts reconciled"
        );
        stale.extend(
            facts
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != keep)
                .map(|(_, (assertion, _))| (*assertion).clone()),
        );
    }

    for assertion in &stale {
        graph.remove(assertion);
    }
    stale.len()
}
