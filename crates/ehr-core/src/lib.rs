//! Row-to-graph conversion.
//!
//! [`convert_rows`] drives one run: every row is mapped by its
//! [`RowSchema`] rule and added to the graph as one batch. The episode pass
//! in [`episodes`] works on a finished graph.

pub mod context;
pub mod episodes;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod rules;
pub mod schema;

pub use context::{ConversionContext, RowView};
pub use episodes::{EpisodeReport, EventDate, segment_episodes};
pub use error::{ConversionError, ConversionFailure, RowRejection};
pub use pipeline::{RunSettings, RunStats, convert_rows};
pub use reconcile::reconcile_max_age;
pub use schema::RowSchema;
