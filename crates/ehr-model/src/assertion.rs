//! Graph facts.
//!
//! Every type here is a plain value: equality, ordering and hashing are
//! structural, so two assertions built independently from the same input
//! compare equal and collapse to one entry in a [`Graph`](crate::Graph).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{ClassId, IndividualId, Iri, NodeKind, PropertyId};
use crate::literal::Literal;

/// A key/value annotation attached to an assertion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub property: PropertyId,
    pub value: Literal,
}

impl Annotation {
    pub fn new(property: PropertyId, value: Literal) -> Self {
        Self { property, value }
    }
}

/// Class expressions used by structural constraints and class definitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum ClassExpression {
    Named {
        class: ClassId,
    },
    /// Everything linked to `individual` through `property`.
    HasValue {
        property: PropertyId,
        individual: IndividualId,
    },
    Intersection {
        operands: Vec<ClassExpression>,
    },
    /// Everything with at least one `property` link into `filler`.
    SomeValuesFrom {
        property: PropertyId,
        filler: Box<ClassExpression>,
    },
    /// Everything whose `property` links all lead into `filler`.
    AllValuesFrom {
        property: PropertyId,
        filler: Box<ClassExpression>,
    },
}

impl ClassExpression {
    pub fn named(class: ClassId) -> Self {
        Self::Named { class }
    }

    pub fn has_value(property: PropertyId, individual: IndividualId) -> Self {
        Self::HasValue {
            property,
            individual,
        }
    }

    pub fn intersection(operands: impl IntoIterator<Item = ClassExpression>) -> Self {
        Self::Intersection {
            operands: operands.into_iter().collect(),
        }
    }

    pub fn some_values_from(property: PropertyId, filler: ClassExpression) -> Self {
        Self::SomeValuesFrom {
            property,
            filler: Box::new(filler),
        }
    }

    pub fn all_values_from(property: PropertyId, filler: ClassExpression) -> Self {
        Self::AllValuesFrom {
            property,
            filler: Box::new(filler),
        }
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<(&'a Iri, NodeKind)>) {
        match self {
            ClassExpression::Named { class } => out.push((class.iri(), NodeKind::Class)),
            ClassExpression::HasValue { individual, .. } => {
                out.push((individual.iri(), NodeKind::Individual));
            }
            ClassExpression::Intersection { operands } => {
                for operand in operands {
                    operand.collect_nodes(out);
                }
            }
            ClassExpression::SomeValuesFrom { filler, .. }
            | ClassExpression::AllValuesFrom { filler, .. } => filler.collect_nodes(out),
        }
    }
}

/// The logical content of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fact {
    /// individual ∈ class
    ClassAssertion {
        class: ClassId,
        individual: IndividualId,
    },
    /// sub ⊑ sup
    SubClassOf { sub: ClassId, sup: ClassId },
    ObjectProperty {
        property: PropertyId,
        subject: IndividualId,
        object: IndividualId,
    },
    DataProperty {
        property: PropertyId,
        subject: IndividualId,
        value: Literal,
    },
    /// sub ⊑ expression
    SubClassOfExpression { sub: ClassId, sup: ClassExpression },
    /// class ≡ expression
    EquivalentClass {
        class: ClassId,
        expression: ClassExpression,
    },
    /// Display label of any node.
    Label { subject: Iri, value: Literal },
    /// No individual may satisfy `expression`.
    Unsatisfiable { expression: ClassExpression },
}

impl Fact {
    /// Nodes referenced by this fact together with the kind each must have.
    pub fn nodes(&self) -> Vec<(&Iri, NodeKind)> {
        let mut out = Vec::new();
        match self {
            Fact::ClassAssertion { class, individual } => {
                out.push((class.iri(), NodeKind::Class));
                out.push((individual.iri(), NodeKind::Individual));
            }
            Fact::SubClassOf { sub, sup } => {
                out.push((sub.iri(), NodeKind::Class));
                out.push((sup.iri(), NodeKind::Class));
            }
            Fact::ObjectProperty {
                subject, object, ..
            } => {
                out.push((subject.iri(), NodeKind::Individual));
                out.push((object.iri(), NodeKind::Individual));
            }
            Fact::DataProperty { subject, .. } => {
                out.push((subject.iri(), NodeKind::Individual));
            }
            Fact::SubClassOfExpression { sub, sup } => {
                out.push((sub.iri(), NodeKind::Class));
                sup.collect_nodes(&mut out);
            }
            Fact::EquivalentClass { class, expression } => {
                out.push((class.iri(), NodeKind::Class));
                expression.collect_nodes(&mut out);
            }
            Fact::Label { .. } => {}
            Fact::Unsatisfiable { expression } => expression.collect_nodes(&mut out),
        }
        out
    }
}

/// A fact plus its (possibly empty) annotation set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assertion {
    pub fact: Fact,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub annotations: BTreeSet<Annotation>,
}

impl Assertion {
    pub fn new(fact: Fact) -> Self {
        Self {
            fact,
            annotations: BTreeSet::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    pub fn class_assertion(class: ClassId, individual: IndividualId) -> Self {
        Self::new(Fact::ClassAssertion { class, individual })
    }

    pub fn sub_class_of(sub: ClassId, sup: ClassId) -> Self {
        Self::new(Fact::SubClassOf { sub, sup })
    }

    pub fn object_property(
        property: PropertyId,
        subject: IndividualId,
        object: IndividualId,
    ) -> Self {
        Self::new(Fact::ObjectProperty {
            property,
            subject,
            object,
        })
    }

    pub fn data_property(property: PropertyId, subject: IndividualId, value: Literal) -> Self {
        Self::new(Fact::DataProperty {
            property,
            subject,
            value,
        })
    }

    pub fn label(subject: Iri, value: impl Into<String>) -> Self {
        Self::new(Fact::Label {
            subject,
            value: Literal::string(value),
        })
    }

    pub fn sub_class_of_expression(sub: ClassId, sup: ClassExpression) -> Self {
        Self::new(Fact::SubClassOfExpression { sub, sup })
    }

    pub fn equivalent_class(class: ClassId, expression: ClassExpression) -> Self {
        Self::new(Fact::EquivalentClass { class, expression })
    }

    pub fn unsatisfiable(expression: ClassExpression) -> Self {
        Self::new(Fact::Unsatisfiable { expression })
    }

    /// First annotation value for `property`, if any.
    pub fn annotation(&self, property: &PropertyId) -> Option<&Literal> {
        self.annotations
            .iter()
            .find(|annotation| &annotation.property == property)
            .map(|annotation| &annotation.value)
    }
}
