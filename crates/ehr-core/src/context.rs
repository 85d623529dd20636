//! Per-run state shared by every row rule.

use ehr_ingest::SourceRow;
use ehr_model::{
    Annotation, ClassId, ConfigError, ConversionOptions, IndividualId, PropertyId, TopCategory,
    Vocabulary,
};
use ehr_terminology::VocabularyRegistry;
use ehr_transform::{CellNormalizer, is_diagnosis, parse_event_date};
use tracing::trace;

use crate::error::RowRejection;

/// Read-only inputs of one conversion run. Rules borrow it; nothing in it
/// changes while rows are mapped.
#[derive(Debug, Clone)]
pub struct ConversionContext<'a> {
    registry: &'a VocabularyRegistry,
    normalizer: CellNormalizer,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        registry: &'a VocabularyRegistry,
        options: &ConversionOptions,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            registry,
            normalizer: CellNormalizer::new(options.entity_delimiter.clone())?,
        })
    }

    pub fn registry(&self) -> &VocabularyRegistry {
        self.registry
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.registry.vocabulary()
    }

    pub fn normalizer(&self) -> &CellNormalizer {
        &self.normalizer
    }

    pub fn row<'r>(&'r self, row: &'r SourceRow) -> RowView<'r> {
        RowView {
            row,
            normalizer: &self.normalizer,
        }
    }

    pub fn class(&self, local: &str) -> Result<ClassId, RowRejection> {
        Ok(self.vocabulary().class(local)?)
    }

    pub fn individual(&self, local: &str) -> Result<IndividualId, RowRejection> {
        Ok(self.vocabulary().individual(local)?)
    }

    pub fn property(&self, local: &str) -> Result<PropertyId, RowRejection> {
        Ok(self.vocabulary().property(local)?)
    }

    pub fn top(&self, category: TopCategory) -> Result<ClassId, RowRejection> {
        Ok(self.vocabulary().top(category)?)
    }

    /// Terminology class of `code`; an unknown code rejects the whole row.
    pub fn resolve(&self, code: &str) -> Result<ClassId, RowRejection> {
        match self.registry.resolve_code(code) {
            Some(class) => Ok(class.clone()),
            None => {
                trace!(code, "code not in terminology");
                Err(RowRejection::UnresolvedCode {
                    code: code.to_string(),
                })
            }
        }
    }

    /// `diagnosed` for diagnosis codes, `experienced` for everything else.
    pub fn condition_property(&self, code: &str) -> Result<PropertyId, RowRejection> {
        use ehr_model::vocabulary::property::{DIAGNOSED, EXPERIENCED};
        self.property(if is_diagnosis(code) {
            DIAGNOSED
        } else {
            EXPERIENCED
        })
    }

    /// Year/month/day annotations from a raw timestamp cell.
    pub fn date_annotations(
        &self,
        view: &RowView<'_>,
        column: usize,
    ) -> Result<[Annotation; 3], RowRejection> {
        let raw = view.raw(column)?;
        let stamp = parse_event_date(raw).ok_or(RowRejection::Unparseable {
            column,
            expected: "timestamp",
        })?;
        Ok(self
            .vocabulary()
            .date_annotations(stamp.year, stamp.month, stamp.day)?)
    }
}

/// Cell access for one row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'r> {
    row: &'r SourceRow,
    normalizer: &'r CellNormalizer,
}

impl<'r> RowView<'r> {
    pub fn line(&self) -> u64 {
        self.row.line
    }

    /// Trimmed raw cell, for display labels and timestamps.
    pub fn raw(&self, column: usize) -> Result<&'r str, RowRejection> {
        self.row
            .cell(column)
            .filter(|value| !value.is_empty())
            .ok_or(RowRejection::MissingField { column })
    }

    /// Raw cell that may legitimately be blank.
    pub fn raw_optional(&self, column: usize) -> Option<&'r str> {
        self.row.cell(column).filter(|value| !value.is_empty())
    }

    /// Normalized cell, usable as a local name.
    pub fn normalized(&self, column: usize) -> Result<String, RowRejection> {
        let value = self.normalizer.normalize(self.row.cell(column).unwrap_or_default());
        if value.is_empty() {
            return Err(RowRejection::MissingField { column });
        }
        Ok(value)
    }
}
