//! Reference tables (drug/condition mappings and the like).
//!
//! Unlike row extracts these are produced by spreadsheet exports, so standard
//! CSV quoting applies. The first line is a header and is skipped.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::IngestError;
use crate::row::SourceRow;

pub fn read_reference_table(path: &Path) -> Result<Vec<SourceRow>, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
    read_reference_bytes(path, &bytes)
}

/// Parses an in-memory table; `path` only labels errors.
pub fn read_reference_bytes(path: &Path, bytes: &[u8]) -> Result<Vec<SourceRow>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let has_header = reader
        .byte_headers()
        .map_err(|e| IngestError::csv(path, e))?
        .iter()
        .any(|cell| !cell.trim_ascii().is_empty());
    if !has_header {
        return Err(IngestError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| IngestError::csv(path, e))?;
        let row = SourceRow::from_record(&record);
        if !row.is_empty() {
            rows.push(row);
        }
    }
    debug!(path = %path.display(), rows = rows.len(), "read reference table");
    Ok(rows)
}
