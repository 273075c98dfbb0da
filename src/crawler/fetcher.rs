//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Fetching the source page
//! - Fetching repository metrics from the REST API
//! - Reading rate-limit headers
//! - Error classification

use crate::config::ApiConfig;
use crate::crawler::auth::Token;
use crate::output::MetricsRecord;
use crate::url::{RepositoryLink, RepositoryReference};
use crate::{AwesomeError, FetchError};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const API_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use awesome_metrics::config::ApiConfig;
/// use awesome_metrics::crawler::build_http_client;
///
/// let client = build_http_client(&ApiConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        // Renamed repositories answer with a redirect
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the source page body
///
/// Any transport failure or non-success status is fatal for the session,
/// since there is nothing to extract.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String, AwesomeError> {
    let page_error = |message: String| AwesomeError::SourcePage {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| page_error(describe_transport_error(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(page_error(format!("HTTP {}", status.as_u16())));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.contains("html") {
        tracing::debug!("Source page Content-Type is '{}', parsing as HTML anyway", content_type);
    }

    response
        .text()
        .await
        .map_err(|e| page_error(describe_transport_error(&e)))
}

/// Rate-limit budget reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests left in the current window
    pub remaining: Option<u64>,

    /// When the window resets
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitStatus {
    /// Reads `X-RateLimit-Remaining` / `X-RateLimit-Reset`, with `Retry-After`
    /// taking precedence for the reset instant
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        let remaining = header_u64("x-ratelimit-remaining");

        let retry_after = header_u64("retry-after")
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        let reset = header_u64("x-ratelimit-reset")
            .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch as i64, 0));

        Self {
            remaining,
            reset_at: retry_after.or(reset),
        }
    }

    /// Returns true if the budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// A successful metrics fetch
#[derive(Debug, Clone)]
pub struct FetchedMetrics {
    pub record: MetricsRecord,
    pub rate_limit: RateLimitStatus,
}

/// Subset of the repository payload we read
#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    watchers_count: u64,
}

/// Fetches repository metrics from the hosting API
///
/// One call, one request: retries and backoff are the coordinator's concern.
#[derive(Debug, Clone)]
pub struct MetricsFetcher {
    client: Client,
    api_base: Url,
    token: Option<Token>,
}

impl MetricsFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `api_base` - REST API root, e.g. `https://api.github.com`
    /// * `token` - Credential attached to every request, if any
    pub fn new(
        client: Client,
        api_base: Url,
        token: Option<Token>,
    ) -> Result<Self, AwesomeError> {
        if api_base.cannot_be_a_base() {
            return Err(crate::UrlError::Malformed(format!(
                "API base URL cannot be a base: {}",
                api_base
            ))
            .into());
        }

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    /// Returns true if requests carry a token
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// API endpoint for a repository: `<base>/repos/<owner>/<name>`
    pub fn endpoint(&self, reference: &RepositoryReference) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", reference.owner.as_str(), reference.name.as_str()]);
        }
        url
    }

    /// Fetches metrics for one repository; the record keeps the link's URL
    ///
    /// # Response Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 200 | record, or MalformedResponse if the body does not decode |
    /// | HTTP 401 | Auth |
    /// | HTTP 429, or 403 with no remaining budget | RateLimited |
    /// | HTTP 403, 404, 410, 451 | NotFound |
    /// | HTTP 5xx, other status | TransientNetwork |
    /// | Timeout, connection failure | TransientNetwork |
    pub async fn fetch(&self, link: &RepositoryLink) -> Result<FetchedMetrics, FetchError> {
        let reference = &link.reference;
        let endpoint = self.endpoint(reference);
        tracing::debug!("GET {}", endpoint);

        let mut request = self
            .client
            .get(endpoint)
            .header(ACCEPT, API_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }

        let response = request.send().await.map_err(|e| FetchError::TransientNetwork {
            reference: reference.to_string(),
            message: describe_transport_error(&e),
        })?;

        let status = response.status();
        let rate_limit = RateLimitStatus::from_headers(response.headers());

        if !status.is_success() {
            return Err(classify_status(status, &rate_limit, reference));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::TransientNetwork {
                reference: reference.to_string(),
                message: describe_transport_error(&e),
            })?;

        let payload: RepositoryPayload =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedResponse {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;

        Ok(FetchedMetrics {
            record: MetricsRecord {
                repository: reference.clone(),
                url: link.url.clone(),
                stars: payload.stargazers_count,
                forks: payload.forks_count,
                watchers: payload.watchers_count,
            },
            rate_limit,
        })
    }
}

/// Maps a non-success API status to a fetch error
pub fn classify_status(
    status: StatusCode,
    rate_limit: &RateLimitStatus,
    reference: &RepositoryReference,
) -> FetchError {
    let reference = reference.to_string();

    match status.as_u16() {
        401 => FetchError::Auth {
            status: status.as_u16(),
        },
        429 => FetchError::RateLimited {
            reference,
            reset_at: rate_limit.reset_at,
        },
        403 if rate_limit.is_exhausted() => FetchError::RateLimited {
            reference,
            reset_at: rate_limit.reset_at,
        },
        403 | 404 | 410 | 451 => FetchError::NotFound {
            reference,
            status: status.as_u16(),
        },
        code => FetchError::TransientNetwork {
            reference,
            message: format!("HTTP {}", code),
        },
    }
}

/// Short description of a transport-level failure
fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else {
        error.to_string()
    }
}
