//! Tabular terminology exports.
//!
//! The expected layout is the ontology portal CSV export: one row per class
//! with a `Class ID`, an optional `Preferred Label` and a `Parents` cell
//! listing parent class identifiers separated by `|`.

use std::collections::BTreeMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use ehr_model::ClassId;
use tracing::{debug, info};

use crate::error::TerminologyError;

pub const CLASS_ID_COLUMN: &str = "Class ID";
pub const PREFERRED_LABEL_COLUMN: &str = "Preferred Label";
pub const PARENTS_COLUMN: &str = "Parents";

/// The universal root; sub-class-of facts to it carry no information.
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

/// One class of the code system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermClass {
    pub id: ClassId,
    pub preferred_label: Option<String>,
    pub parents: Vec<ClassId>,
}

/// A parsed terminology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminologySource {
    pub classes: Vec<TermClass>,
}

impl TerminologySource {
    pub fn new(classes: Vec<TermClass>) -> Self {
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Loads a terminology export. Any unreadable or malformed input is fatal.
pub fn load_terminology(path: &Path) -> Result<TerminologySource, TerminologyError> {
    let bytes = std::fs::read(path).map_err(|e| TerminologyError::io(path, e))?;
    parse_terminology(path, &bytes)
}

pub fn parse_terminology(path: &Path, bytes: &[u8]) -> Result<TerminologySource, TerminologyError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .clone();
    let columns = column_index(&headers);
    let class_column = require(&columns, path, CLASS_ID_COLUMN)?;
    let label_column = columns.get(PREFERRED_LABEL_COLUMN).copied();
    let parents_column = columns.get(PARENTS_COLUMN).copied();

    let mut classes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let line = record.position().map_or(0, csv::Position::line);
        let raw_id = get_field(&record, Some(class_column));
        if raw_id.is_empty() {
            continue;
        }
        let id = ClassId::parse(raw_id.clone()).map_err(|_| TerminologyError::InvalidClass {
            value: raw_id,
            line,
        })?;
        let preferred_label = Some(get_field(&record, label_column)).filter(|v| !v.is_empty());
        let mut parents = Vec::new();
        for parent in get_field(&record, parents_column).split('|') {
            let parent = parent.trim();
            if parent.is_empty() {
                continue;
            }
            let parent =
                ClassId::parse(parent).map_err(|_| TerminologyError::InvalidClass {
                    value: parent.to_string(),
                    line,
                })?;
            parents.push(parent);
        }
        classes.push(TermClass {
            id,
            preferred_label,
            parents,
        });
    }
    info!(path = %path.display(), classes = classes.len(), "terminology parsed");
    Ok(TerminologySource::new(classes))
}

fn column_index(headers: &StringRecord) -> BTreeMap<String, usize> {
    let mut columns = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
        let name = header.trim().trim_matches('\u{feff}');
        debug!(column = name, index, "terminology column");
        columns.entry(name.to_string()).or_insert(index);
    }
    columns
}

fn require(
    columns: &BTreeMap<String, usize>,
    path: &Path,
    column: &'static str,
) -> Result<usize, TerminologyError> {
    columns
        .get(column)
        .copied()
        .ok_or_else(|| TerminologyError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
}

fn get_field(record: &StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn csv_error(path: &Path, error: &csv::Error) -> TerminologyError {
    TerminologyError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
