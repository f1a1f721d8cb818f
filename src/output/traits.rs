//! Sink trait and error types
//!
//! A sink is a persistence destination for the final record batch. Sinks
//! are independent: each one succeeds or fails on its own.

use crate::record::MovieRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("No records to save")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] sqlx::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for persistence destinations
#[async_trait]
pub trait Sink: Send {
    /// Short name used in logs and run reports
    fn name(&self) -> &'static str;

    /// Whether previous contents are cleared before each save
    fn replaces_on_save(&self) -> bool {
        false
    }

    /// Persists the whole batch
    ///
    /// An empty batch is rejected with [`SinkError::Empty`].
    async fn save(&mut self, movies: &[MovieRecord]) -> SinkResult<()>;

    /// Removes everything previously saved
    async fn clear(&mut self) -> SinkResult<()>;
}

/// Outcome of one sink for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOutcome {
    pub sink: &'static str,
    pub success: bool,
    pub error: Option<String>,
}

impl SinkOutcome {
    pub fn succeeded(sink: &'static str) -> Self {
        Self {
            sink,
            success: true,
            error: None,
        }
    }

    pub fn failed(sink: &'static str, error: &SinkError) -> Self {
        Self {
            sink,
            success: false,
            error: Some(error.to_string()),
        }
    }
}
