//! Serialized graph documents.

pub mod document;
pub mod error;

pub use document::{GraphDocument, read_graph, write_graph};
pub use error::OutputError;
