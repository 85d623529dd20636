//! Terminology collaborator and the identifier registry built from it.

pub mod error;
pub mod registry;
pub mod source;

pub use error::TerminologyError;
pub use registry::{HierarchyReport, VocabularyRegistry};
pub use source::{TermClass, TerminologySource, load_terminology, parse_terminology};
