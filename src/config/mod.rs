//! Configuration module for Awesome-Metrics
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use awesome_metrics::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("awesome-metrics.toml")).unwrap();
//! println!("Scrapes abort after {} failures", config.scraper.max_failures);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, LinksConfig, ScraperConfig, DEFAULT_API_BASE_URL,
    DEFAULT_EXCLUDED_OWNERS, DEFAULT_HOST, DEFAULT_MAX_FAILURES,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
