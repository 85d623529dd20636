//! Request and response messages of the classification collaborator.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use ehr_model::{ClassExpression, ClassId, Graph, IndividualId};

use crate::error::ReasonerError;

/// A finished graph handed to a classifier.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'g> {
    pub graph: &'g Graph,
    /// Upper bound on classification time. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl<'g> ClassificationRequest<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Computes a [`Classification`] for a graph.
///
/// An inconsistent graph still classifies; callers that need consistency
/// use [`Classification::ensure_consistent`].
pub trait Classifier {
    fn classify(&self, request: ClassificationRequest<'_>) -> Result<Classification, ReasonerError>;
}

/// An unsatisfiable constraint together with the individuals that satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub expression: ClassExpression,
    pub individuals: BTreeSet<IndividualId>,
}

/// The classifier's answer: the sub-class hierarchy and any violated
/// constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    children: BTreeMap<ClassId, BTreeSet<ClassId>>,
    violations: Vec<Violation>,
}

impl Classification {
    pub fn new(
        children: BTreeMap<ClassId, BTreeSet<ClassId>>,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            children,
            violations,
        }
    }

    /// Builds a consistent classification from `(sub, sup)` pairs.
    pub fn from_hierarchy(pairs: impl IntoIterator<Item = (ClassId, ClassId)>) -> Self {
        let mut children: BTreeMap<ClassId, BTreeSet<ClassId>> = BTreeMap::new();
        for (sub, sup) in pairs {
            if sub != sup {
                children.entry(sup).or_default().insert(sub);
            }
        }
        Self::new(children, Vec::new())
    }

    /// Sub-classes of `class`, excluding `class` itself. With `direct` only
    /// the immediate children are returned, otherwise every descendant.
    pub fn subclasses_of(&self, class: &ClassId, direct: bool) -> BTreeSet<ClassId> {
        let Some(immediate) = self.children.get(class) else {
            return BTreeSet::new();
        };
        if direct {
            return immediate.clone();
        }
        let mut found = BTreeSet::new();
        let mut pending: Vec<&ClassId> = immediate.iter().collect();
        while let Some(next) = pending.pop() {
            if next == class || !found.insert(next.clone()) {
                continue;
            }
            if let Some(grandchildren) = self.children.get(next) {
                pending.extend(grandchildren);
            }
        }
        found
    }

    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<ClassId, BTreeSet<ClassId>>, Vec<Violation>) {
        (self.children, self.violations)
    }

    pub fn ensure_consistent(self) -> Result<Self, ReasonerError> {
        if self.is_consistent() {
            Ok(self)
        } else {
            Err(ReasonerError::Inconsistent {
                violations: self.violations.len(),
            })
        }
    }
}
