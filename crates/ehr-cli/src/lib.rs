//! Library side of the `ehr-graph` command line.

pub mod config;
pub mod logging;
pub mod run;
pub mod summary;
