//! Condition expansion along a subsumption closure.

use std::collections::{BTreeMap, BTreeSet};

use ehr_model::ClassId;
use ehr_reason::Classification;

use crate::record::Provenance;

/// Where sub-classes of a condition come from.
///
/// `None` means no closure is available for that class; the condition is
/// then treated as already maximal.
pub trait SubsumptionLookup {
    fn subclasses(&self, class: &ClassId) -> Option<BTreeSet<ClassId>>;
}

impl SubsumptionLookup for Classification {
    fn subclasses(&self, class: &ClassId) -> Option<BTreeSet<ClassId>> {
        Some(self.subclasses_of(class, false))
    }
}

/// A precomputed closure, e.g. a stub in tests.
impl SubsumptionLookup for BTreeMap<ClassId, BTreeSet<ClassId>> {
    fn subclasses(&self, class: &ClassId) -> Option<BTreeSet<ClassId>> {
        self.get(class).cloned()
    }
}

/// No closure at all: nothing expands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClosure;

impl SubsumptionLookup for NoClosure {
    fn subclasses(&self, _class: &ClassId) -> Option<BTreeSet<ClassId>> {
        None
    }
}

/// `condition` tagged asserted, plus every sub-class from `lookup` tagged
/// inferred.
pub fn expand_closure(
    condition: &ClassId,
    lookup: &impl SubsumptionLookup,
) -> BTreeMap<ClassId, Provenance> {
    let mut expanded: BTreeMap<ClassId, Provenance> = lookup
        .subclasses(condition)
        .unwrap_or_default()
        .into_iter()
        .map(|class| (class, Provenance::Inferred))
        .collect();
    expanded.insert(condition.clone(), Provenance::Asserted);
    expanded
}

/// Expands every asserted condition of one drug. A class is asserted when
/// the drug lists it directly, even if another listed condition also
/// reaches it by expansion.
pub fn expand_conditions(
    asserted: &BTreeSet<ClassId>,
    lookup: &impl SubsumptionLookup,
) -> BTreeMap<ClassId, Provenance> {
    let mut expanded = BTreeMap::new();
    for condition in asserted {
        for (class, _) in expand_closure(condition, lookup) {
            let provenance = if asserted.contains(&class) {
                Provenance::Asserted
            } else {
                Provenance::Inferred
            };
            expanded.insert(class, provenance);
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> ClassId {
        ClassId::parse(format!("http://example.org/#{name}")).unwrap()
    }

    #[test]
    fn absent_closure_is_not_an_error() {
        let expanded = expand_closure(&class("250"), &NoClosure);
        assert_eq!(
            expanded,
            BTreeMap::from([(class("250"), Provenance::Asserted)])
        );
    }

    #[test]
    fn listed_subclass_stays_asserted() {
        let lookup = BTreeMap::from([(
            class("250"),
            BTreeSet::from([class("250.1"), class("250.2")]),
        )]);
        let asserted = BTreeSet::from([class("250"), class("250.1")]);
        let expanded = expand_conditions(&asserted, &lookup);
        assert_eq!(expanded[&class("250.1")], Provenance::Asserted);
        assert_eq!(expanded[&class("250.2")], Provenance::Inferred);
    }
}
