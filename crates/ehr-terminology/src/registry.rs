//! Code-to-class registry.
//!
//! Built once per run from a terminology, then only read: row rules resolve
//! codes against it and never add to it.

use std::collections::{BTreeMap, BTreeSet};

use ehr_model::{
    Assertion, ClassId, ConversionOptions, Graph, IndividualId, PropertyId, Vocabulary,
};
use tracing::{info, warn};

use crate::error::TerminologyError;
use crate::source::{OWL_THING, TerminologySource};

/// Counts reported by [`VocabularyRegistry::load_code_hierarchy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyReport {
    /// Sub-class-of facts copied into the graph.
    pub sub_class_facts: usize,
    /// Parent links to the universal root that were dropped.
    pub root_links_skipped: usize,
    /// Classes with a preferred label, and therefore resolvable.
    pub labeled_classes: usize,
    /// Classes without a preferred label.
    pub unlabeled_classes: usize,
}

#[derive(Debug, Clone)]
pub struct VocabularyRegistry {
    vocabulary: Vocabulary,
    code_prefix: String,
    codes: BTreeMap<String, ClassId>,
    labels: BTreeMap<ClassId, String>,
    roots: BTreeSet<ClassId>,
}

impl VocabularyRegistry {
    pub fn new(options: &ConversionOptions) -> Self {
        Self {
            vocabulary: Vocabulary::new(options),
            code_prefix: options.code_prefix.clone(),
            codes: BTreeMap::new(),
            labels: BTreeMap::new(),
            roots: BTreeSet::new(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Copies the terminology's hierarchy and labels into `graph` and indexes
    /// every labeled class by its code.
    ///
    /// The graph update is all-or-nothing. Classes without a label are
    /// accepted but not indexed.
    pub fn load_code_hierarchy(
        &mut self,
        source: &TerminologySource,
        graph: &mut Graph,
    ) -> Result<HierarchyReport, TerminologyError> {
        let mut report = HierarchyReport::default();
        let mut batch = Vec::new();
        let mut codes = BTreeMap::new();
        let mut labels = BTreeMap::new();
        let mut roots = BTreeSet::new();

        for class in &source.classes {
            if class.parents.iter().all(|parent| parent.as_str() == OWL_THING) {
                roots.insert(class.id.clone());
            }
            for parent in &class.parents {
                if parent.as_str() == OWL_THING {
                    report.root_links_skipped += 1;
                    continue;
                }
                batch.push(Assertion::sub_class_of(class.id.clone(), parent.clone()));
                report.sub_class_facts += 1;
            }
            match &class.preferred_label {
                Some(label) => {
                    batch.push(Assertion::label(class.id.iri().clone(), label.clone()));
                    codes.insert(self.code_of(&class.id).to_string(), class.id.clone());
                    labels.insert(class.id.clone(), label.clone());
                    report.labeled_classes += 1;
                }
                None => report.unlabeled_classes += 1,
            }
        }

        graph.extend(batch)?;
        self.codes.extend(codes);
        self.labels.extend(labels);
        self.roots.extend(roots);

        if report.unlabeled_classes > 0 {
            warn!(
                unlabeled = report.unlabeled_classes,
                "terminology classes without a preferred label are not resolvable"
            );
        }
        info!(
            sub_class_facts = report.sub_class_facts,
            labeled = report.labeled_classes,
            "code hierarchy loaded"
        );
        Ok(report)
    }

    /// The class registered for `code`, if any. Callers drop the row when
    /// this is `None`.
    pub fn resolve_code(&self, code: &str) -> Option<&ClassId> {
        self.codes.get(code)
    }

    /// The code of a terminology class: its identifier without the code
    /// system prefix.
    pub fn code_of<'a>(&self, class: &'a ClassId) -> &'a str {
        class
            .as_str()
            .strip_prefix(self.code_prefix.as_str())
            .unwrap_or(class.as_str())
    }

    pub fn label(&self, class: &ClassId) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    /// Terminology classes with no parent below the universal root.
    pub fn root_classes(&self) -> &BTreeSet<ClassId> {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn class_id(&self, local: &str) -> ehr_model::Result<ClassId> {
        self.vocabulary.class(local)
    }

    pub fn individual_id(&self, local: &str) -> ehr_model::Result<IndividualId> {
        self.vocabulary.individual(local)
    }

    pub fn property_id(&self, local: &str) -> ehr_model::Result<PropertyId> {
        self.vocabulary.property(local)
    }
}
