//! The classification collaborator.
//!
//! Classification is a separate phase after a graph is complete: the caller
//! sends a snapshot in a [`ClassificationRequest`] and gets back a
//! [`Classification`] to query. Any description-logic reasoner can sit
//! behind [`Classifier`]; [`TaxonomyClassifier`] is the built-in one.

pub mod classification;
pub mod error;
pub mod taxonomy;

pub use classification::{Classification, ClassificationRequest, Classifier, Violation};
pub use error::ReasonerError;
pub use taxonomy::TaxonomyClassifier;
