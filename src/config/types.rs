use serde::Deserialize;

/// Default number of consecutive fetch failures before a scrape aborts
pub const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default GitHub REST API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default host whose repository links are extracted
pub const DEFAULT_HOST: &str = "github.com";

/// Path segments on the host that are site sections rather than accounts
pub const DEFAULT_EXCLUDED_OWNERS: &[&str] = &[
    "features",
    "login",
    "explore",
    "marketplace",
    "topics",
    "collections",
    "enterprise",
    "solutions",
    "sponsors",
    "about",
    "pricing",
    "orgs",
    "settings",
    "search",
];

/// Main configuration structure for Awesome-Metrics
///
/// Every section is optional in the TOML file; missing values take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

/// Scrape session behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Consecutive failures that abort the session
    #[serde(rename = "max-failures")]
    pub max_failures: u32,

    /// Pause between consecutive API requests (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Longest wait for a rate-limit reset before retrying (seconds, 0 disables)
    #[serde(rename = "rate-limit-max-wait-secs")]
    pub rate_limit_max_wait_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            request_delay_ms: 0,
            rate_limit_max_wait_secs: 0,
        }
    }
}

/// Hosting API client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: format!("awesome-metrics/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Repository link matching
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Host serving repository pages (a `www.` prefix is also accepted)
    pub host: String,

    /// First path segments that never name an account
    #[serde(rename = "excluded-owners")]
    pub excluded_owners: Vec<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            excluded_owners: DEFAULT_EXCLUDED_OWNERS
                .iter()
                .map(|owner| owner.to_string())
                .collect(),
        }
    }
}
