//! Scrape session state
//!
//! The session owns the collected records and the consecutive-failure
//! counter. It is mutated only by the coordinator, one repository at a time.

use crate::output::MetricsRecord;
use crate::url::RepositoryReference;
use std::collections::HashSet;

/// Records collected so far plus failure bookkeeping
#[derive(Debug, Clone)]
pub struct ScrapeSession {
    records: Vec<MetricsRecord>,
    collected: HashSet<RepositoryReference>,
    consecutive_failures: u32,
    max_failures: u32,
}

impl ScrapeSession {
    /// Creates an empty session
    pub fn new(max_failures: u32) -> Self {
        Self::resume(max_failures, Vec::new())
    }

    /// Creates a session seeded with records from an earlier run
    ///
    /// Duplicate repositories in `records` are dropped, keeping the first.
    pub fn resume(max_failures: u32, records: Vec<MetricsRecord>) -> Self {
        let mut session = Self {
            records: Vec::with_capacity(records.len()),
            collected: HashSet::new(),
            consecutive_failures: 0,
            max_failures: max_failures.max(1),
        };
        for record in records {
            session.push(record);
        }
        session
    }

    /// Returns true if a record for `reference` was already collected
    pub fn contains(&self, reference: &RepositoryReference) -> bool {
        self.collected.contains(reference)
    }

    /// Appends a record and resets the failure counter
    ///
    /// Returns false (and keeps the earlier record) if the repository is
    /// already present.
    pub fn record_success(&mut self, record: MetricsRecord) -> bool {
        self.consecutive_failures = 0;
        self.push(record)
    }

    /// Counts a failure; returns true once the threshold is reached
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        self.threshold_reached()
    }

    pub fn threshold_reached(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    fn push(&mut self, record: MetricsRecord) -> bool {
        if !self.collected.insert(record.repository.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }
}
