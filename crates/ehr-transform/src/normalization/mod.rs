//! Normalization and parsing of individual cells.

pub mod age;
pub mod cell;
pub mod datetime;
pub mod diagnosis;
pub mod numeric;
