//! Scraper module for link extraction and metrics collection
//!
//! This module contains the core scraping logic, including:
//! - Fetching the source page and extracting repository links
//! - API token resolution
//! - Fetching repository metrics from the hosting API
//! - Session state and overall scrape coordination

mod auth;
mod coordinator;
mod fetcher;
mod parser;
mod session;

pub use auth::{
    parse_gh_status_token, EnvToken, ExplicitToken, GhCliToken, NoToken, ResolverChain, Token,
    TokenResolver, TOKEN_ENV_VAR,
};
pub use coordinator::{run_scrape, Coordinator, ScrapeOptions, SessionOutcome};
pub use fetcher::{
    build_http_client, classify_status, fetch_page, FetchedMetrics, MetricsFetcher,
    RateLimitStatus,
};
pub use parser::{parse_html, ParsedPage};
pub use session::ScrapeSession;
