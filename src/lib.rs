//! Awesome-Metrics: popularity metrics for curated link lists
//!
//! This crate scrapes "awesome" pages for GitHub repository links, fetches
//! star/fork/watcher counts for each repository from the GitHub API, and
//! sorts/filters the collected dataset.

pub mod analyze;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Awesome-Metrics operations
#[derive(Debug, Error)]
pub enum AwesomeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch source page {url}: {message}")]
    SourcePage { url: String, message: String },

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failure of a single metrics request
///
/// Everything except [`FetchError::Auth`] is recovered by the coordinator:
/// the repository is skipped and the failure counts toward the
/// consecutive-failure threshold.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Repository not found or inaccessible: {reference} (HTTP {status})")]
    NotFound { reference: String, status: u16 },

    #[error("Rate limited while fetching {reference}")]
    RateLimited {
        reference: String,
        reset_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    #[error("Network error for {reference}: {message}")]
    TransientNetwork { reference: String, message: String },

    #[error("Malformed API response for {reference}: {message}")]
    MalformedResponse { reference: String, message: String },

    #[error("Authentication rejected by the API (HTTP {status})")]
    Auth { status: u16 },
}

impl FetchError {
    /// Returns true if this failure counts toward the consecutive-failure threshold
    pub fn is_countable(&self) -> bool {
        !matches!(self, Self::Auth { .. })
    }
}

/// Errors loading or writing a dataset file
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed dataset {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Failed to write dataset {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// Re-export commonly used types
pub use config::Config;
pub use output::{load_dataset, save_dataset, MetricsRecord};
pub use url::{default_output_path, RepositoryMatcher, RepositoryReference};
