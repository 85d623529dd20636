use std::path::PathBuf;

use ehr_ingest::IngestError;
use ehr_model::{ConfigError, GraphError};
use thiserror::Error;

/// Failures while building the drug safety graph. All are fatal.
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("{path} line {line}: column {column} is missing")]
    MissingColumn {
        path: PathBuf,
        line: u64,
        column: usize,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
