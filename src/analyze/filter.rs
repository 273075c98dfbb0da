//! Query types for dataset analysis

use crate::output::MetricsRecord;
use crate::ConfigError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A numeric popularity metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Stars,
    Forks,
    Watchers,
}

impl Metric {
    /// The value of this metric in `record`
    pub fn value(&self, record: &MetricsRecord) -> u64 {
        match self {
            Self::Stars => record.stars,
            Self::Forks => record.forks,
            Self::Watchers => record.watchers,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stars" => Ok(Self::Stars),
            "forks" => Ok(Self::Forks),
            "watchers" => Ok(Self::Watchers),
            other => Err(format!(
                "unknown metric '{}' (expected stars, forks or watchers)",
                other
            )),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stars => "stars",
            Self::Forks => "forks",
            Self::Watchers => "watchers",
        };
        f.write_str(name)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Inclusive range on one metric; an absent side is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl Bounds {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn is_empty_range(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

/// Bounds on every metric; a record passes only if it satisfies all of them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricFilter {
    pub stars: Bounds,
    pub forks: Bounds,
    pub watchers: Bounds,
}

impl MetricFilter {
    pub fn bounds(&self, metric: Metric) -> &Bounds {
        match metric {
            Metric::Stars => &self.stars,
            Metric::Forks => &self.forks,
            Metric::Watchers => &self.watchers,
        }
    }

    pub fn matches(&self, record: &MetricsRecord) -> bool {
        [Metric::Stars, Metric::Forks, Metric::Watchers]
            .into_iter()
            .all(|metric| self.bounds(metric).contains(metric.value(record)))
    }
}

/// A complete analysis request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisQuery {
    pub sort_by: Metric,
    pub order: SortOrder,
    pub filter: MetricFilter,

    /// Maximum number of records to return
    pub limit: Option<usize>,
}

impl AnalysisQuery {
    /// Rejects bound pairs that can match nothing
    pub fn validate(&self) -> Result<(), ConfigError> {
        for metric in [Metric::Stars, Metric::Forks, Metric::Watchers] {
            let bounds = self.filter.bounds(metric);
            if bounds.is_empty_range() {
                return Err(ConfigError::Validation(format!(
                    "min-{0} ({1}) is greater than max-{0} ({2})",
                    metric,
                    bounds.min.unwrap_or_default(),
                    bounds.max.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    /// Compares two records by the sort key in the requested direction
    pub fn compare(&self, a: &MetricsRecord, b: &MetricsRecord) -> Ordering {
        let ordering = self.sort_by.value(a).cmp(&self.sort_by.value(b));
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}
