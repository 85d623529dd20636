use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// An absolute node or property identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(GraphError::EmptyIdentifier);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fragment after the last `#` or `/`, or the whole identifier when
    /// neither separator is present.
    pub fn short_form(&self) -> &str {
        match self.0.rfind(['#', '/']) {
            Some(index) if index + 1 < self.0.len() => &self.0[index + 1..],
            _ => &self.0,
        }
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Iri);

        impl $name {
            pub fn new(iri: Iri) -> Self {
                Self(iri)
            }

            pub fn parse(value: impl Into<String>) -> Result<Self> {
                Iri::new(value).map(Self)
            }

            pub fn iri(&self) -> &Iri {
                &self.0
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn short_form(&self) -> &str {
                self.0.short_form()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

node_id!(
    /// Handle of a category node.
    ClassId
);
node_id!(
    /// Handle of a concrete-occurrence node.
    IndividualId
);
node_id!(
    /// Handle of an object, data or annotation property.
    PropertyId
);

/// Whether a node is a category or a concrete occurrence. Fixed at first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Class,
    Individual,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Class => "class",
            NodeKind::Individual => "individual",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds namespaced identifiers from already-normalized local names.
///
/// `http://host/base` + `#` + `local` for plain names and
/// `local` + `entity delimiter` + `part` for composite names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    base: String,
    iri_delimiter: String,
    entity_delimiter: String,
}

impl Namespace {
    pub fn new(
        base: impl Into<String>,
        iri_delimiter: impl Into<String>,
        entity_delimiter: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            iri_delimiter: iri_delimiter.into(),
            entity_delimiter: entity_delimiter.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn entity_delimiter(&self) -> &str {
        &self.entity_delimiter
    }

    /// The identifier of the graph document itself.
    pub fn document_iri(&self) -> Result<Iri> {
        Iri::new(self.base.clone())
    }

    pub fn iri(&self, local: &str) -> Result<Iri> {
        if local.is_empty() {
            return Err(GraphError::EmptyIdentifier);
        }
        Iri::new(format!("{}{}{}", self.base, self.iri_delimiter, local))
    }

    pub fn class(&self, local: &str) -> Result<ClassId> {
        self.iri(local).map(ClassId::new)
    }

    pub fn individual(&self, local: &str) -> Result<IndividualId> {
        self.iri(local).map(IndividualId::new)
    }

    pub fn property(&self, local: &str) -> Result<PropertyId> {
        self.iri(local).map(PropertyId::new)
    }

    /// Joins local name parts with the entity delimiter.
    pub fn compose(&self, parts: &[&str]) -> String {
        parts.join(&self.entity_delimiter)
    }
}
