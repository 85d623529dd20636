//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ids::Namespace;

pub const DEFAULT_NAMESPACE: &str = "http://owl.cs.manchester.ac.uk/healthefacts";
pub const DEFAULT_CODE_PREFIX: &str = "http://purl.bioontology.org/ontology/ICD9CM/";
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10_000;

/// Options controlling identifier construction and the conversion loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionOptions {
    /// Base identifier shared by every node of the run.
    pub namespace: String,
    /// Separator between the namespace and a local name.
    pub iri_delimiter: String,
    /// Separator between parts of a composite local name. Also replaces
    /// slashes during cell normalization.
    pub entity_delimiter: String,
    /// Appended to a code to name its individual (`250.1` -> `250.1i`).
    pub individual_suffix: String,
    /// Prefix stripped from terminology class identifiers to obtain codes.
    pub code_prefix: String,
    /// Rows between progress notifications.
    pub progress_interval: usize,
    pub sampling: SamplingOptions,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            iri_delimiter: "#".to_string(),
            entity_delimiter: "-".to_string(),
            individual_suffix: "i".to_string(),
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            sampling: SamplingOptions::default(),
        }
    }
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_entity_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.entity_delimiter = delimiter.into();
        self
    }

    pub fn with_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_prefix = prefix.into();
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(
            self.namespace.clone(),
            self.iri_delimiter.clone(),
            self.entity_delimiter.clone(),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.iri_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter { field: "iri" });
        }
        if self.entity_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter { field: "entity" });
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        self.sampling.validate()
    }
}

/// Random down-sampling of reference rows, used to produce small fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingOptions {
    /// Probability in `[0, 1]` that a row is kept.
    pub scale_factor: f64,
    /// Seed for reproducible sampling; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            seed: None,
        }
    }
}

impl SamplingOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.scale_factor) {
            return Err(ConfigError::ScaleFactorOutOfRange(self.scale_factor));
        }
        Ok(())
    }
}
