//! Contraindications as patient class definitions.
//!
//! Every listed condition gets a class `Patient-<condition>` of the
//! patients having it, and each contraindicated drug adds an implication to
//! that class: such a patient has the drug contraindicated at the record's
//! plausibility. Drugs are classes in this model, so it is written to a
//! graph of its own.

use std::collections::{BTreeMap, BTreeSet};

use ehr_model::vocabulary::DOMAIN_CONCEPT;
use ehr_model::vocabulary::property::{
    HAS_CONDITION, HAS_CONTRAINDICATED_DRUG, HAS_CONTRAINDICATION_PLAUSIBILITY,
};
use ehr_model::{Assertion, ClassExpression, ClassId, Graph, GraphError, TopCategory, Vocabulary};
use ehr_terminology::VocabularyRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SafetyError;
use crate::record::{PLAUSIBILITY, Plausibility, SafetyRecord, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatientClassReport {
    pub drugs: usize,
    /// Drug records skipped because their axioms conflict with the graph.
    pub drugs_rejected: usize,
    /// Distinct `Patient-<condition>` classes defined.
    pub patient_classes: usize,
    /// One per (drug, condition) pair.
    pub implications: usize,
    pub unresolved_codes: usize,
    /// Terminology roots placed under the disease category.
    pub disease_roots: usize,
    pub assertions_added: usize,
}

/// Adds the patient class model of `contraindications` to `graph`.
///
/// Conditions are used as listed, without expansion: the class definitions
/// let a reasoner carry them down the terminology. Each drug record is added
/// as its own batch.
pub fn build_patient_classes(
    contraindications: &BTreeMap<String, SafetyRecord>,
    registry: &VocabularyRegistry,
    graph: &mut Graph,
) -> Result<PatientClassReport, SafetyError> {
    let vocabulary = registry.vocabulary();
    let mut report = PatientClassReport::default();
    let before = graph.len();

    let mut declarations = patient_declarations(vocabulary)?;
    let disease = vocabulary.top(TopCategory::Disease)?;
    for root in registry.root_classes() {
        declarations.push(Assertion::sub_class_of(root.clone(), disease.clone()));
        report.disease_roots += 1;
    }
    graph.extend(declarations)?;

    let mut patient_classes = BTreeSet::new();
    for record in contraindications.values() {
        report.drugs += 1;
        let mut conditions = BTreeSet::new();
        for code in &record.conditions {
            match registry.resolve_code(code) {
                Some(class) => {
                    conditions.insert(class.clone());
                }
                None => {
                    debug!(
                        drug = record.drug_code.as_str(),
                        code = code.as_str(),
                        "condition code not in terminology"
                    );
                    report.unresolved_codes += 1;
                }
            }
        }

        let added = drug_axioms(vocabulary, record, &conditions).and_then(|(axioms, patients)| {
            graph.extend(axioms)?;
            Ok(patients)
        });
        match added {
            Ok(patients) => {
                report.implications += patients.len();
                patient_classes.extend(patients);
            }
            Err(error) => {
                warn!(
                    drug = record.drug_code.as_str(),
                    %error,
                    "drug record conflicts with the graph; skipped"
                );
                report.drugs_rejected += 1;
            }
        }
    }

    report.patient_classes = patient_classes.len();
    report.assertions_added = graph.len() - before;
    info!(
        drugs = report.drugs,
        patient_classes = report.patient_classes,
        implications = report.implications,
        "patient class model built"
    );
    Ok(report)
}

/// Top categories, the plausibility chain and the patient's range axioms.
fn patient_declarations(vocabulary: &Vocabulary) -> Result<Vec<Assertion>, GraphError> {
    let mut out = vocabulary.top_hierarchy()?;
    out.push(Assertion::sub_class_of(
        vocabulary.class(PLAUSIBILITY)?,
        vocabulary.class(DOMAIN_CONCEPT)?,
    ));
    for (sub, sup) in Plausibility::chain() {
        out.push(Assertion::sub_class_of(
            vocabulary.class(sub)?,
            vocabulary.class(sup)?,
        ));
    }
    let patient = vocabulary.top(TopCategory::Patient)?;
    out.push(Assertion::sub_class_of_expression(
        patient.clone(),
        ClassExpression::all_values_from(
            vocabulary.property(HAS_CONTRAINDICATED_DRUG)?,
            ClassExpression::named(vocabulary.top(TopCategory::Drug)?),
        ),
    ));
    out.push(Assertion::sub_class_of_expression(
        patient,
        ClassExpression::all_values_from(
            vocabulary.property(HAS_CONDITION)?,
            ClassExpression::named(vocabulary.top(TopCategory::Disease)?),
        ),
    ));
    Ok(out)
}

/// The drug class and one patient class implication per condition.
fn drug_axioms(
    vocabulary: &Vocabulary,
    record: &SafetyRecord,
    conditions: &BTreeSet<ClassId>,
) -> Result<(Vec<Assertion>, Vec<ClassId>), GraphError> {
    let top_drug = vocabulary.top(TopCategory::Drug)?;
    let top_patient = vocabulary.top(TopCategory::Patient)?;
    let drug = vocabulary.class(&record.drug_code)?;

    let mut out = Vec::new();
    if !record.drug_name.is_empty() {
        out.push(Assertion::label(drug.iri().clone(), record.drug_name.clone()));
    }
    match &record.category {
        Some(category) => {
            let category = vocabulary.class(category)?;
            out.push(Assertion::sub_class_of(category.clone(), top_drug));
            out.push(Assertion::sub_class_of(drug.clone(), category));
        }
        None => out.push(Assertion::sub_class_of(drug.clone(), top_drug)),
    }

    let contraindicated = match record.severity.as_ref().and_then(Severity::level) {
        Some(level) => ClassExpression::intersection([
            ClassExpression::named(drug),
            ClassExpression::some_values_from(
                vocabulary.property(HAS_CONTRAINDICATION_PLAUSIBILITY)?,
                ClassExpression::named(vocabulary.class(level.class_name())?),
            ),
        ]),
        None => ClassExpression::named(drug),
    };
    let implication = ClassExpression::some_values_from(
        vocabulary.property(HAS_CONTRAINDICATED_DRUG)?,
        contraindicated,
    );

    let mut patients = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let patient = vocabulary.class(&vocabulary.compose(&[
            TopCategory::Patient.as_str(),
            condition.short_form(),
        ]))?;
        out.push(Assertion::sub_class_of(patient.clone(), top_patient.clone()));
        out.push(Assertion::equivalent_class(
            patient.clone(),
            ClassExpression::intersection([
                ClassExpression::named(top_patient.clone()),
                ClassExpression::some_values_from(
                    vocabulary.property(HAS_CONDITION)?,
                    ClassExpression::named(condition.clone()),
                ),
            ]),
        ));
        out.push(Assertion::sub_class_of_expression(
            patient.clone(),
            implication.clone(),
        ));
        patients.push(patient);
    }
    Ok((out, patients))
}
