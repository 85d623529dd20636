//! Fixed names of the clinical graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assertion::{Annotation, Assertion};
use crate::error::Result;
use crate::ids::{ClassId, IndividualId, Namespace, PropertyId};
use crate::literal::Literal;
use crate::options::ConversionOptions;

/// Root of every top-level category.
pub const DOMAIN_CONCEPT: &str = "DomainConcept";

/// Annotation keys for the date of a time-stamped fact.
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const DAY: &str = "day";

/// Property local names.
pub mod property {
    pub const HAS_AGE: &str = "hasAge";
    pub const PRESCRIBED_DRUG: &str = "prescribedDrug";
    pub const ORDERED_LAB: &str = "orderedLab";
    pub const DIAGNOSED: &str = "diagnosed";
    pub const EXPERIENCED: &str = "experienced";
    pub const PRESCRIBED: &str = "prescribed";
    pub const ORDERS: &str = "orders";
    pub const STRENGTH: &str = "strength";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const NDC: &str = "ndc";
    pub const DRUG: &str = "drug";
    pub const CONDITION: &str = "condition";
    pub const PLAUSIBILITY: &str = "plausibility";
    pub const ORDER: &str = "order";
    pub const INDICATED_DRUG: &str = "indicatedDrug";
    pub const CONTRAINDICATED_DRUG: &str = "contraindicatedDrug";
    pub const HAS_CONDITION: &str = "hasCondition";
    pub const HAS_CONTRAINDICATED_DRUG: &str = "hasContraindicatedDrug";
    pub const HAS_CONTRAINDICATION_PLAUSIBILITY: &str = "hasContraindicationPlausibility";
}

/// The fixed top-level categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TopCategory {
    Patient,
    Encounter,
    Drug,
    Disease,
    Lab,
    Order,
}

impl TopCategory {
    pub const ALL: [TopCategory; 6] = [
        TopCategory::Patient,
        TopCategory::Encounter,
        TopCategory::Drug,
        TopCategory::Disease,
        TopCategory::Lab,
        TopCategory::Order,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TopCategory::Patient => "Patient",
            TopCategory::Encounter => "Encounter",
            TopCategory::Drug => "Drug",
            TopCategory::Disease => "Disease",
            TopCategory::Lab => "Lab",
            TopCategory::Order => "Order",
        }
    }
}

impl fmt::Display for TopCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopCategory {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        TopCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown top category: {value}"))
    }
}

/// Identifier factory bound to one run's namespace.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    namespace: Namespace,
    individual_suffix: String,
}

impl Vocabulary {
    pub fn new(options: &ConversionOptions) -> Self {
        Self {
            namespace: options.namespace(),
            individual_suffix: options.individual_suffix.clone(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn class(&self, local: &str) -> Result<ClassId> {
        self.namespace.class(local)
    }

    pub fn individual(&self, local: &str) -> Result<IndividualId> {
        self.namespace.individual(local)
    }

    pub fn property(&self, local: &str) -> Result<PropertyId> {
        self.namespace.property(local)
    }

    pub fn top(&self, category: TopCategory) -> Result<ClassId> {
        self.class(category.as_str())
    }

    /// `local` + individual suffix, e.g. `250.1i`.
    pub fn suffixed(&self, local: &str) -> String {
        format!("{local}{}", self.individual_suffix)
    }

    /// `local` + entity delimiter + individual suffix, e.g. `Normal-i`.
    pub fn delimited_suffixed(&self, local: &str) -> String {
        self.namespace.compose(&[local, &self.individual_suffix])
    }

    pub fn compose(&self, parts: &[&str]) -> String {
        self.namespace.compose(parts)
    }

    /// Year, month and day annotations for a time-stamped fact.
    pub fn date_annotations(&self, year: i32, month: u32, day: u32) -> Result<[Annotation; 3]> {
        Ok([
            Annotation::new(self.property(YEAR)?, Literal::integer(i64::from(year))),
            Annotation::new(self.property(MONTH)?, Literal::integer(i64::from(month))),
            Annotation::new(self.property(DAY)?, Literal::integer(i64::from(day))),
        ])
    }

    /// Every top category declared under the common root.
    pub fn top_hierarchy(&self) -> Result<Vec<Assertion>> {
        let root = self.class(DOMAIN_CONCEPT)?;
        TopCategory::ALL
            .into_iter()
            .map(|category| Ok(Assertion::sub_class_of(self.top(category)?, root.clone())))
            .collect()
    }
}
