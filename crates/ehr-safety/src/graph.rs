//! Emission of the drug safety graph.

use std::collections::{BTreeMap, BTreeSet};

use ehr_model::vocabulary::DOMAIN_CONCEPT;
use ehr_model::vocabulary::property::{
    CONDITION, DRUG, ORDER, PLAUSIBILITY as PLAUSIBILITY_PROPERTY,
};
use ehr_model::{
    Assertion, ClassExpression, ClassId, Graph, GraphError, Literal, SamplingOptions,
    TopCategory, Vocabulary,
};
use ehr_terminology::VocabularyRegistry;
use ehr_transform::CellNormalizer;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::closure::{SubsumptionLookup, expand_conditions};
use crate::error::SafetyError;
use crate::record::{PLAUSIBILITY, Plausibility, Provenance, Relation, SafetyRecord};
use crate::tables::{
    Sampler, Table, apply_categories, build_contraindications, build_indications,
    condition_code_map, order_descriptors,
};

/// The reference tables of one run. Indications and order details are
/// optional.
#[derive(Debug, Clone, Copy)]
pub struct SafetySources<'a> {
    pub contraindications: &'a Table,
    pub conditions: &'a Table,
    pub categories: &'a Table,
    pub indications: Option<&'a Table>,
    pub order_details: Option<&'a Table>,
}

/// Per-drug records of both relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafetyRecords {
    pub contraindications: BTreeMap<String, SafetyRecord>,
    pub indications: BTreeMap<String, SafetyRecord>,
}

impl SafetyRecords {
    pub fn build(
        sources: &SafetySources<'_>,
        sampling: &SamplingOptions,
        normalizer: &CellNormalizer,
    ) -> Result<Self, SafetyError> {
        let codes = condition_code_map(sources.conditions, normalizer)?;
        let mut contraindications =
            build_contraindications(sources.contraindications, &codes, normalizer)?;
        apply_categories(&mut contraindications, sources.categories, normalizer)?;

        let mut indications = BTreeMap::new();
        if let Some(table) = sources.indications {
            let orders = match sources.order_details {
                Some(details) => order_descriptors(details, normalizer)?,
                None => BTreeMap::new(),
            };
            let mut sampler = Sampler::new(sampling)?;
            indications = build_indications(table, &codes, &orders, &mut sampler, normalizer)?;
            apply_categories(&mut indications, sources.categories, normalizer)?;
        }
        Ok(Self {
            contraindications,
            indications,
        })
    }

    pub fn get(&self, relation: Relation) -> &BTreeMap<String, SafetyRecord> {
        match relation {
            Relation::Contraindication => &self.contraindications,
            Relation::Indication => &self.indications,
        }
    }
}

/// Counts for one relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationSummary {
    pub drugs: usize,
    /// Drug records skipped because their facts conflict with the graph.
    pub drugs_rejected: usize,
    pub facts_asserted: usize,
    pub facts_inferred: usize,
    /// Distinct condition classes listed directly.
    pub conditions_asserted: usize,
    /// Distinct condition classes after expansion.
    pub conditions_total: usize,
    /// Condition codes missing from the terminology.
    pub unresolved_codes: usize,
}

impl RelationSummary {
    pub fn conditions_inferred(&self) -> usize {
        self.conditions_total - self.conditions_asserted
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SafetyReport {
    pub contraindications: RelationSummary,
    pub indications: RelationSummary,
    /// Unsatisfiable constraints for drugs both indicated and contraindicated.
    pub constraints: usize,
    pub assertions_added: usize,
}

impl SafetyReport {
    pub fn get(&self, relation: Relation) -> &RelationSummary {
        match relation {
            Relation::Contraindication => &self.contraindications,
            Relation::Indication => &self.indications,
        }
    }

    fn get_mut(&mut self, relation: Relation) -> &mut RelationSummary {
        match relation {
            Relation::Contraindication => &mut self.contraindications,
            Relation::Indication => &mut self.indications,
        }
    }
}

/// Facts of one drug record and what they count for.
struct DrugFacts {
    assertions: Vec<Assertion>,
    asserted: BTreeSet<ClassId>,
    inferred: BTreeSet<ClassId>,
    unresolved: usize,
}

/// Adds the drug safety facts of `records` to `graph`.
///
/// Every listed condition is expanded through `lookup`; each (drug,
/// condition) pair becomes a fact individual typed as given or inferred.
/// Conditions whose code is not in the terminology are skipped. Each drug
/// record is added as its own batch: a record that conflicts with the graph
/// is counted in [`RelationSummary::drugs_rejected`] and the others still go
/// in.
pub fn build_safety_graph(
    records: &SafetyRecords,
    registry: &VocabularyRegistry,
    lookup: &impl SubsumptionLookup,
    graph: &mut Graph,
) -> Result<SafetyReport, SafetyError> {
    let vocabulary = registry.vocabulary();
    let mut report = SafetyReport::default();
    let before = graph.len();
    graph.extend(declarations(vocabulary)?)?;

    for relation in Relation::ALL {
        let _span = info_span!("relation", relation = relation.as_str()).entered();
        let summary = report.get_mut(relation);
        let mut asserted_classes = BTreeSet::new();
        let mut all_classes = BTreeSet::new();
        for record in records.get(relation).values() {
            summary.drugs += 1;
            let added = drug_facts(vocabulary, registry, lookup, relation, record).and_then(
                |facts| {
                    graph.extend(facts.assertions)?;
                    Ok((facts.asserted, facts.inferred, facts.unresolved))
                },
            );
            match added {
                Ok((asserted, inferred, unresolved)) => {
                    summary.facts_asserted += asserted.len();
                    summary.facts_inferred += inferred.len();
                    summary.unresolved_codes += unresolved;
                    all_classes.extend(asserted.iter().cloned());
                    all_classes.extend(inferred);
                    asserted_classes.extend(asserted);
                }
                Err(error) => {
                    warn!(
                        drug = record.drug_code.as_str(),
                        %error,
                        "drug record conflicts with the graph; skipped"
                    );
                    summary.drugs_rejected += 1;
                }
            }
        }
        summary.conditions_asserted = asserted_classes.len();
        summary.conditions_total = all_classes.len();
        info!(
            "{} out of {} conditions are inferred to have {}s",
            summary.conditions_inferred(),
            summary.conditions_total,
            relation
        );
    }

    for constraint in detect_inconsistencies(records, vocabulary)? {
        match graph.insert(constraint) {
            Ok(_) => report.constraints += 1,
            Err(error) => warn!(%error, "constraint conflicts with the graph; skipped"),
        }
    }
    report.assertions_added = graph.len() - before;
    info!(
        assertions = report.assertions_added,
        constraints = report.constraints,
        "drug safety graph built"
    );
    Ok(report)
}

/// Drug declaration plus one fact per expanded condition.
fn drug_facts(
    vocabulary: &Vocabulary,
    registry: &VocabularyRegistry,
    lookup: &impl SubsumptionLookup,
    relation: Relation,
    record: &SafetyRecord,
) -> Result<DrugFacts, GraphError> {
    let mut assertions = drug_declaration(vocabulary, record)?;
    let mut listed = BTreeSet::new();
    let mut unresolved = 0;
    for code in &record.conditions {
        match registry.resolve_code(code) {
            Some(class) => {
                listed.insert(class.clone());
            }
            None => {
                debug!(
                    drug = record.drug_code.as_str(),
                    code = code.as_str(),
                    "condition code not in terminology"
                );
                unresolved += 1;
            }
        }
    }

    let mut asserted = BTreeSet::new();
    let mut inferred = BTreeSet::new();
    for (class, provenance) in expand_conditions(&listed, lookup) {
        assertions.extend(condition_fact(
            vocabulary, registry, relation, record, &class, provenance,
        )?);
        match provenance {
            Provenance::Asserted => asserted.insert(class),
            Provenance::Inferred => inferred.insert(class),
        };
    }
    Ok(DrugFacts {
        assertions,
        asserted,
        inferred,
        unresolved,
    })
}

/// The drug individual, its label and its category.
fn drug_declaration(
    vocabulary: &Vocabulary,
    record: &SafetyRecord,
) -> Result<Vec<Assertion>, GraphError> {
    let drug = vocabulary.individual(&record.drug_code)?;
    let top = vocabulary.top(TopCategory::Drug)?;
    let mut out = vec![Assertion::class_assertion(top.clone(), drug.clone())];
    if !record.drug_name.is_empty() {
        out.push(Assertion::label(drug.iri().clone(), record.drug_name.clone()));
    }
    if let Some(category) = &record.category {
        let category = vocabulary.class(category)?;
        out.push(Assertion::sub_class_of(category.clone(), top));
        out.push(Assertion::class_assertion(category, drug));
    }
    Ok(out)
}

/// Top categories, the plausibility chain and the fact classes.
fn declarations(vocabulary: &Vocabulary) -> Result<Vec<Assertion>, GraphError> {
    let mut out = vocabulary.top_hierarchy()?;
    let root = vocabulary.class(DOMAIN_CONCEPT)?;
    out.push(Assertion::sub_class_of(vocabulary.class(PLAUSIBILITY)?, root.clone()));
    for (sub, sup) in Plausibility::chain() {
        out.push(Assertion::sub_class_of(
            vocabulary.class(sub)?,
            vocabulary.class(sup)?,
        ));
    }
    for relation in Relation::ALL {
        let top = vocabulary.class(relation.class_name())?;
        out.push(Assertion::sub_class_of(top.clone(), root.clone()));
        out.push(Assertion::sub_class_of(
            vocabulary.class(relation.given_class_name())?,
            top.clone(),
        ));
        out.push(Assertion::sub_class_of(
            vocabulary.class(relation.inferred_class_name())?,
            top,
        ));
    }
    Ok(out)
}

/// Facts for one (drug, condition) pair under `relation`.
fn condition_fact(
    vocabulary: &Vocabulary,
    registry: &VocabularyRegistry,
    relation: Relation,
    record: &SafetyRecord,
    class: &ClassId,
    provenance: Provenance,
) -> Result<Vec<Assertion>, GraphError> {
    let condition_name = class.short_form();
    let condition = vocabulary.individual(condition_name)?;
    let drug = vocabulary.individual(&record.drug_code)?;
    let fact = vocabulary.individual(&vocabulary.compose(&[
        relation.as_str(),
        condition_name,
        &record.drug_code,
    ]))?;
    let fact_class = match provenance {
        Provenance::Asserted => relation.given_class_name(),
        Provenance::Inferred => relation.inferred_class_name(),
    };

    let mut out = vec![
        Assertion::class_assertion(class.clone(), condition.clone()),
        Assertion::class_assertion(vocabulary.class(fact_class)?, fact.clone()),
        Assertion::object_property(vocabulary.property(DRUG)?, fact.clone(), drug),
        Assertion::object_property(
            vocabulary.property(CONDITION)?,
            fact.clone(),
            condition.clone(),
        ),
    ];
    if let Some(label) = registry.label(class) {
        out.push(Assertion::label(condition.iri().clone(), label));
    }
    if let Some(severity) = &record.severity {
        out.push(Assertion::data_property(
            vocabulary.property(PLAUSIBILITY_PROPERTY)?,
            fact.clone(),
            Literal::string(severity.text()),
        ));
        if let Some(level) = severity.level() {
            out.push(Assertion::class_assertion(
                vocabulary.class(level.class_name())?,
                fact.clone(),
            ));
        }
    }
    if let Some(order) = &record.order {
        out.push(Assertion::data_property(
            vocabulary.property(ORDER)?,
            fact,
            Literal::string(order.clone()),
        ));
    }
    Ok(out)
}

/// One constraint per drug present in both relations: nothing may be linked
/// to the drug as both indicated and contraindicated.
pub fn detect_inconsistencies(
    records: &SafetyRecords,
    vocabulary: &Vocabulary,
) -> Result<Vec<Assertion>, GraphError> {
    let indicated = vocabulary.property(Relation::Indication.drug_property())?;
    let contraindicated = vocabulary.property(Relation::Contraindication.drug_property())?;
    let mut out = Vec::new();
    for drug_code in records.indications.keys() {
        if !records.contraindications.contains_key(drug_code) {
            continue;
        }
        let drug = vocabulary.individual(drug_code)?;
        debug!(drug = drug_code.as_str(), "drug is both indicated and contraindicated");
        out.push(Assertion::unsatisfiable(ClassExpression::intersection([
            ClassExpression::has_value(indicated.clone(), drug.clone()),
            ClassExpression::has_value(contraindicated.clone(), drug),
        ])));
    }
    Ok(out)
}
