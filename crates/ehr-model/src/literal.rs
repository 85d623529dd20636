use std::fmt;

use serde::{Deserialize, Serialize};

/// Value type of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    String,
    Integer,
    Decimal,
}

/// A typed data value, compared by lexical form and datatype.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Datatype,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            lexical: value.into(),
            datatype: Datatype::String,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Datatype::Integer,
        }
    }

    /// Decimal literal; whole numbers drop their fractional part (`72.0` -> `72`).
    pub fn decimal(value: f64) -> Self {
        let mut lexical = format!("{value}");
        if lexical.contains('.') {
            lexical = lexical
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string();
        }
        Self {
            lexical,
            datatype: Datatype::Decimal,
        }
    }

    /// Numeric view of integer and decimal literals.
    pub fn as_f64(&self) -> Option<f64> {
        match self.datatype {
            Datatype::Integer | Datatype::Decimal => self.lexical.parse().ok(),
            Datatype::String => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.datatype {
            Datatype::Integer => self.lexical.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}
