use ehr_ingest::IngestError;
use ehr_model::GraphError;
use thiserror::Error;

/// Why a single row produced no assertions. Never fatal for a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("column {column} is missing or empty")]
    MissingField { column: usize },

    #[error("measurement is zero (not recorded)")]
    ZeroMeasurement,

    #[error("age {age} is above 100")]
    AgeOutOfRange { age: i64 },

    #[error("code {code:?} is not in the terminology")]
    UnresolvedCode { code: String },

    #[error("column {column} is not a valid {expected}")]
    Unparseable {
        column: usize,
        expected: &'static str,
    },

    #[error("measurement {measurement:?} is excluded by this schema")]
    ExcludedMeasurement { measurement: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl RowRejection {
    /// Stable key used to tally rejections.
    pub fn reason(&self) -> &'static str {
        match self {
            RowRejection::MissingField { .. } => "missing-field",
            RowRejection::ZeroMeasurement => "zero-measurement",
            RowRejection::AgeOutOfRange { .. } => "age-out-of-range",
            RowRejection::UnresolvedCode { .. } => "unresolved-code",
            RowRejection::Unparseable { .. } => "unparseable",
            RowRejection::ExcludedMeasurement { .. } => "excluded-measurement",
            RowRejection::Graph(GraphError::EmptyIdentifier) => "empty-identifier",
            RowRejection::Graph(GraphError::NodeKindConflict { .. }) => "node-kind-conflict",
        }
    }
}

/// What stopped a conversion.
#[derive(Debug, Error)]
pub enum ConversionFailure {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A fatal conversion failure, with the number of rows handled before it.
#[derive(Debug, Error)]
#[error("conversion failed after {rows_processed} rows: {failure}")]
pub struct ConversionError {
    pub rows_processed: u64,
    #[source]
    pub failure: ConversionFailure,
}

impl ConversionError {
    pub(crate) fn new(rows_processed: u64, failure: impl Into<ConversionFailure>) -> Self {
        Self {
            rows_processed,
            failure: failure.into(),
        }
    }
}
