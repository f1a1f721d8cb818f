//! Output module for persisting harvested records
//!
//! This module handles:
//! - The [`Sink`] capability shared by every persistence destination
//! - CSV, SQLite and MySQL sinks
//! - Reading statistics back from the SQLite database

mod csv_sink;
mod mysql_sink;
mod schema;
mod sqlite_sink;
pub mod stats;
mod traits;

pub use csv_sink::{CsvSink, LIST_SEPARATOR};
pub use mysql_sink::MySqlSink;
pub use sqlite_sink::SqliteSink;
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use traits::{Sink, SinkError, SinkOutcome, SinkResult};

use crate::config::OutputConfig;
use std::path::Path;

/// Builds the sinks enabled in the output configuration
///
/// Sinks are returned in the order CSV, SQLite, MySQL. A sink that cannot
/// be opened is reported as a failed outcome instead of aborting the run,
/// so the remaining sinks still receive the batch.
pub async fn build_sinks(config: &OutputConfig) -> (Vec<Box<dyn Sink>>, Vec<SinkOutcome>) {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    let mut failures = Vec::new();

    if let Some(path) = &config.csv_path {
        sinks.push(Box::new(CsvSink::new(path)));
    }

    if let Some(path) = &config.sqlite_path {
        match SqliteSink::open(Path::new(path)) {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => {
                tracing::error!("Failed to open SQLite database {}: {}", path, e);
                failures.push(SinkOutcome::failed("sqlite", &e));
            }
        }
    }

    if let Some(url) = &config.mysql_url {
        match MySqlSink::connect(url).await {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => {
                tracing::error!("Failed to connect to MySQL: {}", e);
                failures.push(SinkOutcome::failed("mysql", &e));
            }
        }
    }

    if sinks.is_empty() && failures.is_empty() {
        tracing::warn!("No output configured; records will not be persisted");
    }

    (sinks, failures)
}
