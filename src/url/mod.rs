//! URL handling module for Awesome-Metrics
//!
//! This module recognizes repository URLs on the hosting platform and derives
//! default dataset paths from source page URLs.

mod output_path;
mod repository;

pub use output_path::default_output_path;
pub use repository::{RepositoryLink, RepositoryMatcher, RepositoryReference};

use crate::UrlError;
use url::Url;

/// Parses a source page URL given on the command line
///
/// Only HTTP(S) URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use awesome_metrics::url::parse_source_url;
///
/// assert!(parse_source_url("https://github.com/sindresorhus/awesome").is_ok());
/// assert!(parse_source_url("mailto:someone@example.com").is_err());
/// ```
pub fn parse_source_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
