//! Run configuration: an optional TOML file plus command-line overrides.
//!
//! ```toml
//! schema = "medicine-lab-diagnosis-time"
//!
//! [conversion]
//! namespace = "http://example.org/ehr"
//! progress_interval = 5000
//!
//! [conversion.sampling]
//! scale_factor = 0.1
//! seed = 42
//!
//! [reasoner]
//! timeout_ms = 60000
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use ehr_core::RowSchema;
use ehr_model::ConversionOptions;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub conversion: ConversionOptions,
    /// Row schema used by `convert` when `--schema` is absent.
    pub schema: Option<RowSchema>,
    pub reasoner: ReasonerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReasonerConfig {
    pub timeout_ms: Option<u64>,
}

impl ReasonerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The file at `path`, or defaults when no file is given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

/// Flags that override single configuration values.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionOverrides {
    /// Base identifier of every node in the output graph.
    #[arg(long, value_name = "IRI", global = true)]
    pub namespace: Option<String>,

    /// Separator inside composite local names.
    #[arg(long = "entity-delimiter", value_name = "TEXT", global = true)]
    pub entity_delimiter: Option<String>,

    /// Prefix stripped from terminology class identifiers to obtain codes.
    #[arg(long = "code-prefix", value_name = "IRI", global = true)]
    pub code_prefix: Option<String>,

    /// Rows between progress reports.
    #[arg(long = "progress-interval", value_name = "ROWS", global = true)]
    pub progress_interval: Option<usize>,
}

impl OptionOverrides {
    pub fn apply(&self, mut options: ConversionOptions) -> ConversionOptions {
        if let Some(namespace) = &self.namespace {
            options.namespace.clone_from(namespace);
        }
        if let Some(delimiter) = &self.entity_delimiter {
            options.entity_delimiter.clone_from(delimiter);
        }
        if let Some(prefix) = &self.code_prefix {
            options.code_prefix.clone_from(prefix);
        }
        if let Some(interval) = self.progress_interval {
            options.progress_interval = interval;
        }
        options
    }
}
