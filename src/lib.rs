//! Chart-Harvest: a resilient top-chart movie scraper
//!
//! This crate fetches a ranked movie chart and each title's detail page,
//! extracts a flat per-movie record, and hands the batch to independent
//! persistence sinks (CSV, SQLite, MySQL).

pub mod config;
pub mod crawler;
pub mod output;
pub mod pages;
pub mod record;

use thiserror::Error;

/// Main error type for Chart-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Unknown fetch strategy: {0}")]
    UnknownStrategy(String),
}

/// Result type alias for Chart-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchFailure, FetchedPage, Fetcher, Harvester};
pub use record::MovieRecord;
