//! Scrape coordinator - main session orchestration logic
//!
//! This module contains the scrape loop that coordinates:
//! - Fetching the source page and extracting repository references
//! - Fetching metrics for each reference in order
//! - Consecutive-failure accounting and aborts
//! - Rate-limit backoff and request pacing
//! - Persisting the dataset after every success

use crate::config::{Config, ScraperConfig};
use crate::crawler::auth::{Token, TokenResolver};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchedMetrics, MetricsFetcher, RateLimitStatus};
use crate::crawler::parser::parse_html;
use crate::crawler::session::ScrapeSession;
use crate::output::{load_dataset_if_exists, save_dataset, FailureTally, ScrapeReport};
use crate::url::{default_output_path, RepositoryLink, RepositoryMatcher};
use crate::{AwesomeError, FetchError, UrlError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// How a scrape session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every reference was processed
    Completed,

    /// The consecutive-failure threshold was reached
    AbortedFailures { consecutive_failures: u32 },

    /// A failure that does not count toward the threshold, such as
    /// rejected credentials
    AbortedFatal { reason: String },
}

impl SessionOutcome {
    /// Returns true if the session stopped before processing every reference
    pub fn is_abort(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::AbortedFailures {
                consecutive_failures,
            } => write!(
                f,
                "aborted after {} consecutive failures",
                consecutive_failures
            ),
            Self::AbortedFatal { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

/// Per-invocation scrape options
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Page to extract repository links from
    pub source_url: Url,

    /// Dataset path; derived from `source_url` when None
    pub output: Option<PathBuf>,

    /// Seed the session from an existing dataset and skip its repositories
    pub resume: bool,
}

impl ScrapeOptions {
    pub fn new(source_url: Url) -> Self {
        Self {
            source_url,
            output: None,
            resume: false,
        }
    }

    /// The dataset path this scrape writes to
    pub fn output_path(&self) -> Result<PathBuf, UrlError> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => default_output_path(&self.source_url),
        }
    }
}

/// Main scrape coordinator structure
pub struct Coordinator {
    config: ScraperConfig,
    matcher: RepositoryMatcher,
    client: Client,
    fetcher: MetricsFetcher,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `token` - API credential resolved for this session, if any
    pub fn new(config: &Config, token: Option<Token>) -> Result<Self, AwesomeError> {
        let client = build_http_client(&config.api)?;
        let api_base = Url::parse(&config.api.base_url)?;
        let fetcher = MetricsFetcher::new(client.clone(), api_base, token)?;

        Ok(Self {
            config: config.scraper.clone(),
            matcher: RepositoryMatcher::from_config(&config.links),
            client,
            fetcher,
        })
    }

    /// Fetches the source page and extracts its repository links
    ///
    /// A page without repository links yields an empty list, not an error.
    pub async fn discover(&self, source_url: &Url) -> Result<Vec<RepositoryLink>, AwesomeError> {
        tracing::info!("Extracting repository links from {}", source_url);

        let html = fetch_page(&self.client, source_url).await?;
        let parsed = parse_html(&html, source_url, &self.matcher);

        if parsed.links.is_empty() {
            tracing::warn!(
                "No repository links found on {} ({} links inspected)",
                source_url,
                parsed.links_seen
            );
        } else {
            tracing::info!(
                "Found {} repositories on '{}' ({} links inspected)",
                parsed.links.len(),
                parsed.title.as_deref().unwrap_or("untitled page"),
                parsed.links_seen
            );
        }

        Ok(parsed.links)
    }

    /// Runs a complete scrape session
    ///
    /// 1. Load the existing dataset when resuming
    /// 2. Fetch the source page and extract references
    /// 3. Fetch metrics for every reference, persisting after each success
    ///
    /// Aborts (failure threshold, rejected credentials) are reported in the
    /// returned [`ScrapeReport`], not as errors; the dataset is persisted either way.
    pub async fn run(&self, options: &ScrapeOptions) -> Result<ScrapeReport, AwesomeError> {
        let output_path = options.output_path()?;

        let session = if options.resume {
            let records = load_dataset_if_exists(&output_path)?;
            tracing::info!(
                "Resuming with {} records from {}",
                records.len(),
                output_path.display()
            );
            ScrapeSession::resume(self.config.max_failures, records)
        } else {
            ScrapeSession::new(self.config.max_failures)
        };

        let links = self.discover(&options.source_url).await?;

        self.process(options.source_url.as_str(), links, session, &output_path)
            .await
    }

    /// Fetches metrics for the repositories behind `links` in order
    ///
    /// # Per-reference handling
    ///
    /// | Result | Action |
    /// |--------|--------|
    /// | Success | append, reset failure counter, persist dataset |
    /// | NotFound, RateLimited, TransientNetwork, MalformedResponse | count failure, skip |
    /// | Failure counter reaches threshold | stop |
    /// | Auth (not countable) | stop immediately |
    pub async fn process(
        &self,
        source_url: &str,
        links: Vec<RepositoryLink>,
        mut session: ScrapeSession,
        output_path: &Path,
    ) -> Result<ScrapeReport, AwesomeError> {
        let start_time = Instant::now();
        let discovered = links.len();
        let mut skipped = 0;
        let mut failures = FailureTally::default();
        let mut outcome = SessionOutcome::Completed;
        let mut requests_sent = 0;

        tracing::info!(
            "Fetching metrics for {} repositories ({} requests)",
            discovered,
            if self.fetcher.is_authenticated() {
                "authenticated"
            } else {
                "unauthenticated"
            }
        );

        for (index, link) in links.iter().enumerate() {
            let reference = &link.reference;
            if session.contains(reference) {
                tracing::debug!("Skipping {}: already collected", reference);
                skipped += 1;
                continue;
            }

            if requests_sent > 0 {
                self.pace().await;
            }

            tracing::info!("[{}/{}] Fetching metrics for {}", index + 1, discovered, reference);
            let (result, attempts) = self.fetch_with_backoff(link).await;
            requests_sent += attempts;

            match result {
                Ok(FetchedMetrics { record, rate_limit }) => {
                    tracing::debug!(
                        "{}: {} stars, {} forks, {} watchers",
                        reference,
                        record.stars,
                        record.forks,
                        record.watchers
                    );
                    session.record_success(record);
                    save_dataset(output_path, session.records())?;
                    self.wait_for_budget(&rate_limit).await;
                }
                Err(e) if !e.is_countable() => {
                    tracing::error!("{}, aborting", e);
                    outcome = SessionOutcome::AbortedFatal {
                        reason: e.to_string(),
                    };
                    break;
                }
                Err(e) => {
                    failures.record(&e);
                    let threshold_reached = session.record_failure();
                    tracing::warn!(
                        "Skipping {}: {} ({}/{} consecutive failures)",
                        reference,
                        e,
                        session.consecutive_failures(),
                        session.max_failures()
                    );

                    if threshold_reached {
                        tracing::error!(
                            "Reached the maximum of {} consecutive failures, aborting",
                            session.max_failures()
                        );
                        outcome = SessionOutcome::AbortedFailures {
                            consecutive_failures: session.consecutive_failures(),
                        };
                        break;
                    }
                }
            }
        }

        // Final write also covers sessions without any success
        save_dataset(output_path, session.records())?;

        let report = ScrapeReport {
            source_url: source_url.to_string(),
            output_path: output_path.to_path_buf(),
            outcome,
            discovered,
            skipped,
            collected: session.len(),
            failures,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Scrape {}: {} records saved to {} in {:?}",
            report.outcome,
            report.collected,
            report.output_path.display(),
            report.elapsed
        );

        Ok(report)
    }

    /// Fetches one reference, retrying once after a rate-limit reset when
    /// the reset falls within the configured wait budget
    ///
    /// Returns the result and the number of requests sent.
    async fn fetch_with_backoff(
        &self,
        link: &RepositoryLink,
    ) -> (Result<FetchedMetrics, FetchError>, usize) {
        let result = self.fetcher.fetch(link).await;

        let reset_at = match &result {
            Err(FetchError::RateLimited { reset_at, .. }) => Some(*reset_at),
            _ => None,
        };
        let Some(wait) = reset_at.and_then(|reset_at| self.backoff_wait(reset_at)) else {
            return (result, 1);
        };

        tracing::warn!(
            "Rate limited on {}, waiting {}s for the limit to reset",
            link,
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;

        (self.fetcher.fetch(link).await, 2)
    }

    /// Sleeps until the rate-limit window resets if the budget is exhausted
    async fn wait_for_budget(&self, rate_limit: &RateLimitStatus) {
        if !rate_limit.is_exhausted() {
            return;
        }

        if let Some(wait) = self.backoff_wait(rate_limit.reset_at) {
            tracing::info!(
                "Rate limit budget exhausted, sleeping {}s until reset",
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Time to wait for a reset, or None if waiting is disabled, the reset is
    /// unknown, or it lies beyond the wait budget
    fn backoff_wait(&self, reset_at: Option<DateTime<Utc>>) -> Option<Duration> {
        if self.config.rate_limit_max_wait_secs == 0 {
            return None;
        }

        let reset_at = reset_at?;
        let wait = (reset_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let budget = Duration::from_secs(self.config.rate_limit_max_wait_secs);

        if wait > budget {
            tracing::warn!(
                "Rate limit resets in {}s, beyond the {}s wait budget",
                wait.as_secs(),
                budget.as_secs()
            );
            return None;
        }

        Some(wait)
    }

    /// Pause between consecutive API requests
    async fn pace(&self) {
        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }
}

/// Runs a scrape session
///
/// The token is resolved exactly once, before the first request.
///
/// # Example
///
/// ```no_run
/// use awesome_metrics::config::Config;
/// use awesome_metrics::crawler::{run_scrape, ResolverChain, ScrapeOptions};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ScrapeOptions::new(Url::parse("https://github.com/sindresorhus/awesome")?);
/// let report = run_scrape(&Config::default(), &options, &ResolverChain::standard(None)).await?;
/// println!("{} records", report.collected);
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(
    config: &Config,
    options: &ScrapeOptions,
    resolver: &dyn TokenResolver,
) -> Result<ScrapeReport, AwesomeError> {
    let token = resolver.resolve().await;
    let coordinator = Coordinator::new(config, token)?;
    coordinator.run(options).await
}
