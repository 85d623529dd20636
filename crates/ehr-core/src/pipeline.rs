//! Row conversion pipeline.
//!
//! Rows stream from a reader through the selected schema's rule into the
//! graph. Rejected rows are counted and logged, never fatal; a read failure
//! stops the run and reports how many rows were handled before it.

use std::collections::BTreeMap;

use ehr_ingest::{IngestError, SourceRow};
use ehr_model::vocabulary::property::HAS_AGE;
use ehr_model::{ConversionOptions, Graph};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::context::ConversionContext;
use crate::error::{ConversionError, RowRejection};
use crate::reconcile::reconcile_max_age;
use crate::schema::RowSchema;

/// Logged in place of cell contents unless data logging is enabled.
pub const REDACTED: &str = "<redacted>";

/// How a conversion run reports on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Rows between progress callbacks. Zero disables them.
    pub progress_interval: usize,
    /// Log rejected row contents at trace level.
    pub log_data: bool,
}

impl RunSettings {
    pub fn from_options(options: &ConversionOptions) -> Self {
        Self {
            progress_interval: options.progress_interval,
            log_data: false,
        }
    }

    pub fn with_log_data(mut self, log_data: bool) -> Self {
        self.log_data = log_data;
        self
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_options(&ConversionOptions::default())
    }
}

/// Counts from one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub rows_read: u64,
    pub rows_mapped: u64,
    pub assertions_added: usize,
    /// Rejected rows by [`RowRejection::reason`].
    pub rejections: BTreeMap<&'static str, u64>,
    /// Age facts removed by the max-age pass.
    pub ages_reconciled: usize,
}

impl RunStats {
    pub fn rows_rejected(&self) -> u64 {
        self.rejections.values().sum()
    }

    fn reject(&mut self, rejection: &RowRejection) {
        *self.rejections.entry(rejection.reason()).or_insert(0) += 1;
    }
}

/// Maps every row into `graph` under `schema`.
///
/// The top-level categories are declared first. Each row's assertions are
/// added as one batch, so a row either contributes all of its facts or
/// none. Schemas that record ages get the max-age pass once every row has
/// been read.
pub fn convert_rows<I, F>(
    rows: I,
    schema: RowSchema,
    ctx: &ConversionContext<'_>,
    graph: &mut Graph,
    settings: RunSettings,
    mut on_progress: F,
) -> Result<RunStats, ConversionError>
where
    I: IntoIterator<Item = Result<SourceRow, IngestError>>,
    F: FnMut(u64),
{
    let mut stats = RunStats::default();
    let top = ctx
        .vocabulary()
        .top_hierarchy()
        .map_err(|e| ConversionError::new(0, e))?;
    stats.assertions_added += graph
        .extend(top)
        .map_err(|e| ConversionError::new(0, e))?;

    for row in rows {
        let row = row.map_err(|e| ConversionError::new(stats.rows_read, e))?;
        stats.rows_read += 1;

        let outcome = schema
            .map_row(ctx, &row)
            .and_then(|batch| graph.extend(batch).map_err(RowRejection::from));
        match outcome {
            Ok(added) => {
                stats.rows_mapped += 1;
                stats.assertions_added += added;
            }
            Err(rejection) => {
                debug!(
                    line = row.line,
                    reason = rejection.reason(),
                    %rejection,
                    "row skipped"
                );
                if settings.log_data {
                    trace!(line = row.line, cells = ?row.cells, "skipped row contents");
                } else {
                    trace!(line = row.line, cells = REDACTED, "skipped row contents");
                }
                stats.reject(&rejection);
            }
        }

        if settings.progress_interval > 0
            && stats.rows_read % settings.progress_interval as u64 == 0
        {
            info!(rows = stats.rows_read, "rows processed");
            on_progress(stats.rows_read);
        }
    }

    if schema.emits_age() {
        let has_age = ctx
            .vocabulary()
            .property(HAS_AGE)
            .map_err(|e| ConversionError::new(stats.rows_read, e))?;
        stats.ages_reconciled = reconcile_max_age(graph, &has_age);
    }

    info!(
        schema = %schema,
        rows_read = stats.rows_read,
        rows_mapped = stats.rows_mapped,
        rows_rejected = stats.rows_rejected(),
        assertions = graph.len(),
        "conversion finished"
    );
    Ok(stats)
}
