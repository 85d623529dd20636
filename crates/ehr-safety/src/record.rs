//! Drug safety records.

use std::collections::BTreeSet;
use std::fmt;

use ehr_model::vocabulary::property::{CONTRAINDICATED_DRUG, INDICATED_DRUG};
use serde::Serialize;
use tracing::warn;

/// Local name of the plausibility root class.
pub const PLAUSIBILITY: &str = "Plausibility";

/// How strongly a contraindication holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Plausibility {
    Minimal,
    Moderate,
    High,
}

impl Plausibility {
    /// Checked in this order against the severity text.
    const MATCH_ORDER: [Plausibility; 3] = [
        Plausibility::Minimal,
        Plausibility::Moderate,
        Plausibility::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Plausibility::Minimal => "Minimal",
            Plausibility::Moderate => "Moderate",
            Plausibility::High => "High",
        }
    }

    /// Class of this level in the `High ⊑ Medium ⊑ Low ⊑ Plausibility` chain.
    pub fn class_name(self) -> &'static str {
        match self {
            Plausibility::Minimal => "Low",
            Plausibility::Moderate => "Medium",
            Plausibility::High => "High",
        }
    }

    /// `(sub, sup)` class names of the plausibility chain.
    pub fn chain() -> [(&'static str, &'static str); 3] {
        [
            (Plausibility::High.class_name(), Plausibility::Moderate.class_name()),
            (Plausibility::Moderate.class_name(), Plausibility::Minimal.class_name()),
            (Plausibility::Minimal.class_name(), PLAUSIBILITY),
        ]
    }
}

/// Severity of a contraindication, as far as it could be recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Severity {
    Known(Plausibility),
    /// Text that names no level, kept verbatim.
    Unrecognized(String),
}

impl Severity {
    /// Reads a level from free text by substring match.
    pub fn parse(text: &str) -> Self {
        Plausibility::MATCH_ORDER
            .into_iter()
            .find(|level| text.contains(level.as_str()))
            .map_or_else(|| Severity::Unrecognized(text.to_string()), Severity::Known)
    }

    pub fn level(&self) -> Option<Plausibility> {
        match self {
            Severity::Known(level) => Some(*level),
            Severity::Unrecognized(_) => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Severity::Known(level) => level.as_str(),
            Severity::Unrecognized(text) => text,
        }
    }

    /// The higher recognized level wins; a recognized level beats
    /// unrecognized text; between two unrecognized texts the first stays.
    fn merge(self, other: Severity) -> Severity {
        match (self.level(), other.level()) {
            (Some(a), Some(b)) if b > a => other,
            (None, Some(_)) => other,
            _ => self,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// The two relations between a drug and a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Relation {
    Contraindication,
    Indication,
}

impl Relation {
    pub const ALL: [Relation; 2] = [Relation::Contraindication, Relation::Indication];

    /// Prefix of fact individual names.
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Contraindication => "contraindication",
            Relation::Indication => "indication",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Relation::Contraindication => "Contraindication",
            Relation::Indication => "Indication",
        }
    }

    pub fn given_class_name(self) -> &'static str {
        match self {
            Relation::Contraindication => "GivenContraindication",
            Relation::Indication => "GivenIndication",
        }
    }

    pub fn inferred_class_name(self) -> &'static str {
        match self {
            Relation::Contraindication => "InferredContraindication",
            Relation::Indication => "InferredIndication",
        }
    }

    /// Property linking a subject to a drug under this relation.
    pub fn drug_property(self) -> &'static str {
        match self {
            Relation::Contraindication => CONTRAINDICATED_DRUG,
            Relation::Indication => INDICATED_DRUG,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a condition was listed in the source or reached by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Provenance {
    Asserted,
    Inferred,
}

/// Everything known about one drug under one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyRecord {
    pub drug_code: String,
    pub drug_name: String,
    pub category: Option<String>,
    pub severity: Option<Severity>,
    /// Order descriptor, indications only.
    pub order: Option<String>,
    /// Terminology codes of the listed conditions.
    pub conditions: BTreeSet<String>,
}

impl SafetyRecord {
    pub fn new(drug_code: impl Into<String>, drug_name: impl Into<String>) -> Self {
        Self {
            drug_code: drug_code.into(),
            drug_name: drug_name.into(),
            category: None,
            severity: None,
            order: None,
            conditions: BTreeSet::new(),
        }
    }

    /// Folds a later row for the same drug into this record. Conditions
    /// accumulate; severity keeps the higher level; the first non-empty name
    /// stays.
    pub fn merge(&mut self, other: SafetyRecord) {
        if self.drug_name.is_empty() {
            self.drug_name = other.drug_name;
        }
        if self.category.is_none() {
            self.category = other.category;
        }
        if self.order.is_none() {
            self.order = other.order;
        }
        self.severity = match (self.severity.take(), other.severity) {
            (Some(current), Some(next)) => Some(current.merge(next)),
            (current, next) => current.or(next),
        };
        self.conditions.extend(other.conditions);
    }
}

pub(crate) fn log_unrecognized(severity: &Severity, drug_code: &str, line: u64) {
    if let Severity::Unrecognized(text) = severity {
        warn!(
            drug = drug_code,
            line,
            severity = text.as_str(),
            "severity names no known level; kept verbatim"
        );
    }
}
