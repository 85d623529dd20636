use csv::ByteRecord;
use tracing::warn;

/// One data line of an extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: u64,
    pub cells: Vec<String>,
}

impl SourceRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    /// Decodes a parsed record. Bytes that are not UTF-8 become U+FFFD, so a
    /// badly encoded cell fails that row's own checks instead of the file.
    pub fn from_record(record: &ByteRecord) -> Self {
        let line = record.position().map_or(0, csv::Position::line);
        let mut lossy = false;
        let cells = record
            .iter()
            .map(|cell| match std::str::from_utf8(cell) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    lossy = true;
                    String::from_utf8_lossy(cell).into_owned()
                }
            })
            .collect();
        if lossy {
            warn!(line, "row is not valid UTF-8; undecodable bytes replaced");
        }
        Self { line, cells }
    }

    /// Raw cell content with surrounding whitespace and BOM trimmed.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .map(|cell| cell.trim().trim_matches('\u{feff}'))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}
