//! Streaming reader for row extracts.
//!
//! Extracts are comma-delimited with one header line. Quote characters carry
//! no meaning: a quoted comma still splits the cell, and the quotes stay in
//! the cell for the normalizer to drop. Cells are decoded lossily; read
//! failures of the underlying source stay errors.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ByteRecordsIntoIter, ReaderBuilder};
use tracing::debug;

use crate::error::IngestError;
use crate::row::SourceRow;

/// Iterator over the data lines of an extract.
pub struct RowReader<R: Read> {
    path: PathBuf,
    records: ByteRecordsIntoIter<R>,
}

impl RowReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        debug!(path = %path.display(), "opened row extract");
        Ok(Self::from_reader(path, BufReader::new(file)))
    }
}

impl<R: Read> RowReader<R> {
    /// Reads from any source; `label` is used in error messages.
    pub fn from_reader(label: impl Into<PathBuf>, reader: R) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(true)
            .quoting(false)
            .flexible(true)
            .from_reader(reader)
            .into_byte_records();
        Self {
            path: label.into(),
            records,
        }
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<SourceRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(error) => return Some(Err(IngestError::csv(&self.path, error))),
            };
            let row = SourceRow::from_record(&record);
            if row.is_empty() {
                continue;
            }
            return Some(Ok(row));
        }
    }
}
