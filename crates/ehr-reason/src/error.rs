use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    #[error("classification did not finish within {limit:?}")]
    Timeout { limit: Duration },

    #[error("graph is inconsistent: {violations} unsatisfiable constraint(s) have instances")]
    Inconsistent { violations: usize },

    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
