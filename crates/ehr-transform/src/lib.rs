//! Value-level rules shared by every row schema.

pub mod normalization;

pub use normalization::age::{AgeBand, AgeError, parse_age_years};
pub use normalization::cell::CellNormalizer;
pub use normalization::datetime::{DateStamp, EVENT_DATETIME_FORMAT, parse_event_date};
pub use normalization::diagnosis::is_diagnosis;
pub use normalization::numeric::{parse_f64, parse_i64};
