//! Scrape session statistics
//!
//! This module provides the end-of-session report produced by the
//! coordinator and its console rendering.

use crate::crawler::SessionOutcome;
use crate::FetchError;
use std::path::PathBuf;
use std::time::Duration;

/// Per-kind counts of skipped repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureTally {
    pub not_found: u64,
    pub rate_limited: u64,
    pub transient: u64,
    pub malformed: u64,
}

impl FailureTally {
    /// Counts one failure; authentication errors are not tallied
    pub fn record(&mut self, error: &FetchError) {
        match error {
            FetchError::NotFound { .. } => self.not_found += 1,
            FetchError::RateLimited { .. } => self.rate_limited += 1,
            FetchError::TransientNetwork { .. } => self.transient += 1,
            FetchError::MalformedResponse { .. } => self.malformed += 1,
            FetchError::Auth { .. } => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.not_found + self.rate_limited + self.transient + self.malformed
    }
}

/// Summary of one scrape session
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// The scraped page
    pub source_url: String,

    /// Where the dataset was written
    pub output_path: PathBuf,

    /// How the session ended
    pub outcome: SessionOutcome,

    /// Distinct repositories found on the page
    pub discovered: usize,

    /// Repositories skipped because a resumed dataset already had them
    pub skipped: usize,

    /// Records in the persisted dataset
    pub collected: usize,

    /// Failed fetches by kind
    pub failures: FailureTally,

    /// Wall-clock duration of the session
    pub elapsed: Duration,
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &ScrapeReport) {
    println!("=== Scrape Report ===\n");

    println!("Source: {}", report.source_url);
    println!("Output: {}", report.output_path.display());
    println!("Outcome: {}", report.outcome);
    println!();

    println!("Repositories:");
    println!("  Discovered: {}", report.discovered);
    if report.skipped > 0 {
        println!("  Already collected: {}", report.skipped);
    }
    println!("  Collected: {}", report.collected);
    println!();

    if report.failures.total() > 0 {
        println!("Failures ({}):", report.failures.total());
        println!("  Not found: {}", report.failures.not_found);
        println!("  Rate limited: {}", report.failures.rate_limited);
        println!("  Network errors: {}", report.failures.transient);
        println!("  Malformed responses: {}", report.failures.malformed);
        println!();
    }

    println!(
        "Finished in {:.1}s with {} records saved",
        report.elapsed.as_secs_f64(),
        report.collected
    );
}
