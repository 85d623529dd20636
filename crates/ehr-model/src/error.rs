use thiserror::Error;

use crate::ids::{Iri, NodeKind};

/// Errors raised by the assertion accumulator and identifier construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("node {iri} is a {existing} and cannot be used as a {requested}")]
    NodeKindConflict {
        iri: Iri,
        existing: NodeKind,
        requested: NodeKind,
    },
}

/// Invalid run configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("{field} delimiter must not be empty")]
    EmptyDelimiter { field: &'static str },

    #[error("entity delimiter {delimiter:?} contains a character removed by cell normalization")]
    UnstableEntityDelimiter { delimiter: String },

    #[error("scale factor {0} is outside [0, 1]")]
    ScaleFactorOutOfRange(f64),

    #[error("progress interval must be positive")]
    ZeroProgressInterval,
}

pub type Result<T> = std::result::Result<T, GraphError>;
