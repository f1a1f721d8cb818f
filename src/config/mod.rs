//! Configuration module for Chart-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use chart_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Fetching with {} retries", config.scraper.retries);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, HeaderConfig, OutputConfig, ScraperConfig, SelectorConfig, StrategyKind,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;

pub(crate) use validation::parse_selector;
