//! Output error types.

use std::path::PathBuf;

use ehr_model::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid graph document")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The finished temporary file could not be moved into place.
    #[error("failed to move the finished document into {target_path}")]
    AtomicWriteFailed {
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} holds conflicting assertions")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },
}

impl OutputError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
