//! Output module for datasets, reports and rendered results
//!
//! This module handles:
//! - Persisting and loading the JSON dataset
//! - Rendering analysis results as text, JSON, or markdown
//! - Reporting scrape session statistics

mod dataset;
mod markdown;
pub mod stats;
mod table;

pub use dataset::{load_dataset, load_dataset_if_exists, save_dataset, MetricsRecord};
pub use markdown::{format_markdown_report, format_markdown_table};
pub use stats::{print_report, FailureTally, ScrapeReport};
pub use table::format_table;

use crate::AwesomeError;
use std::fmt;
use std::str::FromStr;

/// How analysis results are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table
    #[default]
    Table,
    /// Pretty-printed JSON array, same schema as the dataset
    Json,
    /// Markdown table
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!(
                "unknown format '{}' (expected table, json or markdown)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

/// Renders records in the requested format
pub fn render(records: &[&MetricsRecord], format: OutputFormat) -> Result<String, AwesomeError> {
    match format {
        OutputFormat::Table => Ok(format_table(records)),
        OutputFormat::Markdown => Ok(format_markdown_table(records)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(records)
                .map_err(|e| AwesomeError::Io(std::io::Error::from(e)))?;
            json.push('\n');
            Ok(json)
        }
    }
}
