//! Readers for clinical extracts and reference tables.

pub mod error;
pub mod reference;
pub mod row;
pub mod rows;

pub use error::IngestError;
pub use reference::{read_reference_bytes, read_reference_table};
pub use row::SourceRow;
pub use rows::RowReader;
