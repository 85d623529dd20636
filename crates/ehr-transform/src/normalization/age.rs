//! Age parsing and banding.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::numeric::{parse_f64, parse_i64};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("age {0:?} is neither whole years nor a month count")]
pub struct AgeError(pub String);

/// Parses an age in whole years. Values that are not integers are read as a
/// month count and converted to years, rounding half away from zero.
pub fn parse_age_years(value: &str) -> Result<i64, AgeError> {
    if let Some(years) = parse_i64(value) {
        return Ok(years);
    }
    let months = parse_f64(value).ok_or_else(|| AgeError(value.to_string()))?;
    // Saturating cast; anything this large is rejected by the caller's range check.
    Ok((months / 12.0).round() as i64)
}

/// Eleven age bands, each inclusive of its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    UpTo10,
    To20,
    To30,
    To40,
    To50,
    To60,
    To70,
    To80,
    To90,
    To100,
    Over100,
}

impl AgeBand {
    pub const ALL: [AgeBand; 11] = [
        AgeBand::UpTo10,
        AgeBand::To20,
        AgeBand::To30,
        AgeBand::To40,
        AgeBand::To50,
        AgeBand::To60,
        AgeBand::To70,
        AgeBand::To80,
        AgeBand::To90,
        AgeBand::To100,
        AgeBand::Over100,
    ];

    pub fn from_years(age: i64) -> Self {
        if age <= 10 {
            return AgeBand::UpTo10;
        }
        if age > 100 {
            return AgeBand::Over100;
        }
        // 11..=20 -> 1, 91..=100 -> 9
        let index = ((age - 1) / 10) as usize;
        AgeBand::ALL[index]
    }

    /// Local class name of the band, e.g. `Age(10-20]`.
    pub fn label(self) -> &'static str {
        match self {
            AgeBand::UpTo10 => "Age<=10",
            AgeBand::To20 => "Age(10-20]",
            AgeBand::To30 => "Age(20-30]",
            AgeBand::To40 => "Age(30-40]",
            AgeBand::To50 => "Age(40-50]",
            AgeBand::To60 => "Age(50-60]",
            AgeBand::To70 => "Age(60-70]",
            AgeBand::To80 => "Age(70-80]",
            AgeBand::To90 => "Age(80-90]",
            AgeBand::To100 => "Age(90-100]",
            AgeBand::Over100 => "Age>100",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
