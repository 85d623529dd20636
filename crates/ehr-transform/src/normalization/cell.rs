//! Cleaning of single cells into identifier-safe local names.

use ehr_model::ConfigError;

/// Characters dropped from every cell.
const REMOVED: [char; 9] = [' ', '"', '\'', '\n', '\t', '\r', '%', '(', ')'];
/// Path separators replaced by the entity delimiter.
const SEPARATORS: [char; 2] = ['\\', '/'];

/// Normalizes raw cells. `normalize(normalize(x)) == normalize(x)` for
/// every input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellNormalizer {
    delimiter: String,
}

impl CellNormalizer {
    /// Fails when the delimiter would itself be rewritten by normalization.
    pub fn new(delimiter: impl Into<String>) -> Result<Self, ConfigError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter { field: "entity" });
        }
        if delimiter
            .chars()
            .any(|ch| REMOVED.contains(&ch) || SEPARATORS.contains(&ch))
        {
            return Err(ConfigError::UnstableEntityDelimiter { delimiter });
        }
        Ok(Self { delimiter })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if REMOVED.contains(&ch) {
                continue;
            }
            if SEPARATORS.contains(&ch) {
                out.push_str(&self.delimiter);
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl Default for CellNormalizer {
    fn default() -> Self {
        Self {
            delimiter: "-".to_string(),
        }
    }
}
