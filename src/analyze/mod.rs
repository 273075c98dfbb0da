//! Dataset analysis
//!
//! Loads a dataset written by a scrape, keeps the records inside the
//! requested metric bounds and sorts them by one metric.

mod filter;

pub use filter::{AnalysisQuery, Bounds, Metric, MetricFilter, SortOrder};

use crate::output::{load_dataset, MetricsRecord};
use crate::AwesomeError;
use std::path::Path;

/// Applies a query to a record sequence
///
/// Sorting is stable: records with equal keys keep their dataset order in
/// both directions.
///
/// # Example
///
/// ```
/// use awesome_metrics::analyze::{apply, AnalysisQuery};
/// use awesome_metrics::{MetricsRecord, RepositoryReference};
///
/// let records: Vec<MetricsRecord> = [10, 50, 30]
///     .into_iter()
///     .map(|stars| MetricsRecord {
///         repository: RepositoryReference::new("o", &format!("r{}", stars)),
///         url: format!("https://github.com/o/r{}", stars),
///         stars,
///         forks: 0,
///         watchers: 0,
///     })
///     .collect();
///
/// let view = apply(&records, &AnalysisQuery::default());
/// let stars: Vec<u64> = view.iter().map(|r| r.stars).collect();
/// assert_eq!(stars, vec![50, 30, 10]);
/// ```
pub fn apply<'a>(records: &'a [MetricsRecord], query: &AnalysisQuery) -> Vec<&'a MetricsRecord> {
    let mut view: Vec<&MetricsRecord> = records
        .iter()
        .filter(|record| query.filter.matches(record))
        .collect();

    view.sort_by(|a, b| query.compare(a, b));

    if let Some(limit) = query.limit {
        view.truncate(limit);
    }

    view
}

/// Validates the query, loads the dataset at `path` and applies the query
///
/// # Returns
///
/// * `Ok(Vec<MetricsRecord>)` - The filtered, sorted view
/// * `Err(AwesomeError::Config)` - The query has an inverted bound pair
/// * `Err(AwesomeError::Dataset)` - The dataset is missing or malformed
pub fn analyze_file(path: &Path, query: &AnalysisQuery) -> Result<Vec<MetricsRecord>, AwesomeError> {
    query.validate()?;

    let records = load_dataset(path)?;
    tracing::debug!("Loaded {} records from {}", records.len(), path.display());

    let view: Vec<MetricsRecord> = apply(&records, query).into_iter().cloned().collect();
    tracing::info!(
        "{} of {} records match, sorted by {} ({:?})",
        view.len(),
        records.len(),
        query.sort_by,
        query.order
    );

    Ok(view)
}
