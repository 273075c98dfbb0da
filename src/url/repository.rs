use crate::config::LinksConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Owner/name pair identifying one hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// Account (user or organization) owning the repository
    pub owner: String,

    /// Repository name
    pub name: String,
}

impl RepositoryReference {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository together with the page link it was first found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLink {
    pub reference: RepositoryReference,

    /// The link target, resolved against the page URL but otherwise as written
    pub url: String,
}

impl fmt::Display for RepositoryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// Recognizes repository URLs on a single host
///
/// A URL names a repository when its host is the configured host (optionally
/// prefixed with `www.`) and its path has exactly two non-empty segments.
/// Query strings and fragments are ignored.
#[derive(Debug, Clone)]
pub struct RepositoryMatcher {
    host: String,
    excluded_owners: Vec<String>,
}

impl RepositoryMatcher {
    pub fn new(host: &str, excluded_owners: &[String]) -> Self {
        Self {
            host: host.to_lowercase(),
            excluded_owners: excluded_owners.iter().map(|o| o.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &LinksConfig) -> Self {
        Self::new(&config.host, &config.excluded_owners)
    }

    /// Returns the repository named by `url`, if it has the repository shape
    ///
    /// # Examples
    ///
    /// ```
    /// use awesome_metrics::url::{RepositoryMatcher, RepositoryReference};
    /// use url::Url;
    ///
    /// let matcher = RepositoryMatcher::new("github.com", &["topics".to_string()]);
    ///
    /// let url = Url::parse("https://github.com/rust-lang/rust?tab=readme#intro").unwrap();
    /// assert_eq!(
    ///     matcher.match_url(&url),
    ///     Some(RepositoryReference::new("rust-lang", "rust"))
    /// );
    ///
    /// let url = Url::parse("https://github.com/topics/rust").unwrap();
    /// assert_eq!(matcher.match_url(&url), None);
    /// ```
    pub fn match_url(&self, url: &Url) -> Option<RepositoryReference> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        let host = url.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if host != self.host {
            return None;
        }

        let mut segments = url.path().trim_matches('/').split('/');
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let name = segments.next().filter(|s| !s.is_empty())?;
        if segments.next().is_some() {
            return None;
        }

        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return None;
        }

        let owner_lower = owner.to_lowercase();
        if self.excluded_owners.iter().any(|o| *o == owner_lower) {
            return None;
        }

        Some(RepositoryReference::new(owner, name))
    }

    /// Parses `href` and matches it; returns None for unparseable input
    pub fn match_str(&self, href: &str) -> Option<RepositoryReference> {
        Url::parse(href).ok().and_then(|url| self.match_url(&url))
    }
}

impl Default for RepositoryMatcher {
    fn default() -> Self {
        Self::from_config(&LinksConfig::default())
    }
}
