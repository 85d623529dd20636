#![deny(unsafe_code)]

use std::path::PathBuf;

use ehr_model::GraphError;

#[derive(Debug, thiserror::Error)]
pub enum TerminologyError {
    #[error("failed to read terminology {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse terminology CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("terminology {path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("invalid class identifier {value:?} at line {line}")]
    InvalidClass { value: String, line: u64 },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl TerminologyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
