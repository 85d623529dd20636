//! Reference tables and the records built from them.
//!
//! Codes and identifiers are normalized like row cells; display names and
//! severity text are kept as written.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use ehr_ingest::{SourceRow, read_reference_bytes, read_reference_table};
use ehr_model::SamplingOptions;
use ehr_transform::CellNormalizer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::SafetyError;
use crate::record::{SafetyRecord, Severity, log_unrecognized};

/// Joins the non-empty order fields of a drug.
pub const ORDER_SEPARATOR: &str = ", ";

/// Contraindication table: `[_, drug code, drug name, condition id, _, _, _, severity]`.
mod contraindication_columns {
    pub const DRUG_CODE: usize = 1;
    pub const DRUG_NAME: usize = 2;
    pub const CONDITION: usize = 3;
    pub const SEVERITY: usize = 7;
}

/// Condition map: `[code, _, condition id]`.
mod condition_columns {
    pub const CODE: usize = 0;
    pub const CONDITION: usize = 2;
}

/// Drug categories: `[drug code, _, _, category]`.
mod category_columns {
    pub const DRUG_CODE: usize = 0;
    pub const CATEGORY: usize = 3;
}

/// Indications: `[drug code, drug name, condition id]`.
mod indication_columns {
    pub const DRUG_CODE: usize = 0;
    pub const DRUG_NAME: usize = 1;
    pub const CONDITION: usize = 2;
}

/// Order details: `[drug code, form, dose, quantity, route, frequency, duration]`.
mod order_columns {
    pub const DRUG_CODE: usize = 0;
    pub const FIELDS: std::ops::RangeInclusive<usize> = 1..=6;
}

/// A loaded reference table.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    rows: Vec<SourceRow>,
}

impl Table {
    pub fn load(path: &Path) -> Result<Self, SafetyError> {
        Ok(Self {
            path: path.to_path_buf(),
            rows: read_reference_table(path)?,
        })
    }

    pub fn from_bytes(label: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, SafetyError> {
        let path = label.into();
        let rows = read_reference_bytes(&path, bytes)?;
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[SourceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A cell that must exist; short rows are malformed input.
    fn cell<'r>(&self, row: &'r SourceRow, column: usize) -> Result<&'r str, SafetyError> {
        row.cell(column).ok_or_else(|| SafetyError::MissingColumn {
            path: self.path.clone(),
            line: row.line,
            column,
        })
    }

    fn normalized(
        &self,
        row: &SourceRow,
        column: usize,
        normalizer: &CellNormalizer,
    ) -> Result<String, SafetyError> {
        Ok(normalizer.normalize(self.cell(row, column)?))
    }
}

/// Condition id to the set of terminology codes it stands for.
pub type ConditionCodes = BTreeMap<String, BTreeSet<String>>;

pub fn condition_code_map(
    table: &Table,
    normalizer: &CellNormalizer,
) -> Result<ConditionCodes, SafetyError> {
    let mut map = ConditionCodes::new();
    for row in table.rows() {
        let condition = table.normalized(row, condition_columns::CONDITION, normalizer)?;
        let code = table.normalized(row, condition_columns::CODE, normalizer)?;
        if condition.is_empty() || code.is_empty() {
            continue;
        }
        map.entry(condition).or_default().insert(code);
    }
    debug!(conditions = map.len(), "condition map built");
    Ok(map)
}

/// One record per drug; later rows for a drug add to its conditions.
pub fn build_contraindications(
    table: &Table,
    codes: &ConditionCodes,
    normalizer: &CellNormalizer,
) -> Result<BTreeMap<String, SafetyRecord>, SafetyError> {
    let mut records: BTreeMap<String, SafetyRecord> = BTreeMap::new();
    let mut unmapped = 0usize;
    for row in table.rows() {
        let drug_code = table.normalized(row, contraindication_columns::DRUG_CODE, normalizer)?;
        if drug_code.is_empty() {
            continue;
        }
        let mut record = SafetyRecord::new(
            drug_code.clone(),
            table.cell(row, contraindication_columns::DRUG_NAME)?,
        );
        let condition = table.normalized(row, contraindication_columns::CONDITION, normalizer)?;
        match codes.get(&condition) {
            Some(mapped) => record.conditions.extend(mapped.iter().cloned()),
            None => unmapped += 1,
        }
        let severity = Severity::parse(table.cell(row, contraindication_columns::SEVERITY)?);
        log_unrecognized(&severity, &drug_code, row.line);
        record.severity = Some(severity);
        merge_into(&mut records, record);
    }
    info!(
        drugs = records.len(),
        rows = table.len(),
        unmapped_conditions = unmapped,
        "contraindications built"
    );
    Ok(records)
}

/// Sets the category of drugs already in `records`; other rows are ignored.
pub fn apply_categories(
    records: &mut BTreeMap<String, SafetyRecord>,
    table: &Table,
    normalizer: &CellNormalizer,
) -> Result<usize, SafetyError> {
    let mut applied = 0;
    for row in table.rows() {
        let drug_code = table.normalized(row, category_columns::DRUG_CODE, normalizer)?;
        let category = table.normalized(row, category_columns::CATEGORY, normalizer)?;
        if category.is_empty() {
            continue;
        }
        if let Some(record) = records.get_mut(&drug_code) {
            record.category = Some(category);
            applied += 1;
        }
    }
    Ok(applied)
}

/// Order descriptor per drug: the non-empty order fields joined by
/// [`ORDER_SEPARATOR`]. The first row of a drug wins.
pub fn order_descriptors(
    table: &Table,
    normalizer: &CellNormalizer,
) -> Result<BTreeMap<String, String>, SafetyError> {
    let mut orders = BTreeMap::new();
    for row in table.rows() {
        let drug_code = table.normalized(row, order_columns::DRUG_CODE, normalizer)?;
        if drug_code.is_empty() {
            continue;
        }
        let fields: Vec<&str> = order_columns::FIELDS
            .filter_map(|column| row.cell(column))
            .filter(|value| !value.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }
        orders
            .entry(drug_code)
            .or_insert_with(|| fields.join(ORDER_SEPARATOR));
    }
    Ok(orders)
}

/// Keeps each row with probability `scale_factor`.
#[derive(Debug)]
pub struct Sampler {
    scale_factor: f64,
    rng: StdRng,
}

impl Sampler {
    pub fn new(options: &SamplingOptions) -> Result<Self, SafetyError> {
        options.validate()?;
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            scale_factor: options.scale_factor,
            rng,
        })
    }

    pub fn keep(&mut self) -> bool {
        if self.scale_factor >= 1.0 {
            return true;
        }
        self.rng.random_bool(self.scale_factor)
    }
}

/// Indication records, sampled row by row, each carrying its drug's order
/// descriptor when one is known.
pub fn build_indications(
    table: &Table,
    codes: &ConditionCodes,
    orders: &BTreeMap<String, String>,
    sampler: &mut Sampler,
    normalizer: &CellNormalizer,
) -> Result<BTreeMap<String, SafetyRecord>, SafetyError> {
    let mut records: BTreeMap<String, SafetyRecord> = BTreeMap::new();
    let mut sampled_out = 0usize;
    for row in table.rows() {
        if !sampler.keep() {
            sampled_out += 1;
            continue;
        }
        let drug_code = table.normalized(row, indication_columns::DRUG_CODE, normalizer)?;
        if drug_code.is_empty() {
            continue;
        }
        let mut record = SafetyRecord::new(
            drug_code.clone(),
            table.cell(row, indication_columns::DRUG_NAME)?,
        );
        let condition = table.normalized(row, indication_columns::CONDITION, normalizer)?;
        if let Some(mapped) = codes.get(&condition) {
            record.conditions.extend(mapped.iter().cloned());
        }
        record.order = orders.get(&drug_code).cloned();
        merge_into(&mut records, record);
    }
    info!(
        drugs = records.len(),
        rows = table.len(),
        sampled_out,
        "indications built"
    );
    Ok(records)
}

fn merge_into(records: &mut BTreeMap<String, SafetyRecord>, record: SafetyRecord) {
    match records.get_mut(&record.drug_code) {
        Some(existing) => existing.merge(record),
        None => {
            records.insert(record.drug_code.clone(), record);
        }
    }
}
