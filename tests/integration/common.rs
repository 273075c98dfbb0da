//! Shared fixtures for the integration tests

use awesome_metrics::config::Config;
use awesome_metrics::crawler::ScrapeOptions;
use serde_json::json;
use std::path::Path;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the awesome-list page on the mock server
pub const PAGE_PATH: &str = "/awesome";

/// Creates a test configuration whose API points at the mock server
pub fn test_config(server: &MockServer, max_failures: u32) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.timeout_secs = 5;
    config.scraper.max_failures = max_failures;
    config
}

/// Scrape options for the mock page, writing to `output`
pub fn test_options(server: &MockServer, output: &Path) -> ScrapeOptions {
    let source_url = Url::parse(&format!("{}{}", server.uri(), PAGE_PATH))
        .expect("Failed to parse page URL");
    let mut options = ScrapeOptions::new(source_url);
    options.output = Some(output.to_path_buf());
    options
}

/// Renders an awesome-list page linking to `repos` ("owner/name") in order
pub fn awesome_page(repos: &[&str]) -> String {
    let items: String = repos
        .iter()
        .map(|repo| format!(r#"<li><a href="https://github.com/{0}">{0}</a> - A project.</li>"#, repo))
        .collect();

    format!(
        r#"<html><head><title>Awesome Test</title></head><body>
        <h1>Awesome Test</h1>
        <p><a href="https://github.com/sindresorhus/awesome/blob/main/readme.md"><img src="badge.svg"></a></p>
        <a href="https://github.com/topics/awesome">topic</a>
        <ul>{}</ul>
        <a href="https://github.com/login">Sign in</a>
        </body></html>"#,
        items
    )
}

/// Mounts the awesome-list page
pub async fn mount_page(server: &MockServer, repos: &[&str]) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(awesome_page(repos))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// API payload for a repository, with the extra fields the API really sends
pub fn repo_payload(repo: &str, stars: u64, forks: u64, watchers: u64) -> serde_json::Value {
    json!({
        "full_name": repo,
        "private": false,
        "stargazers_count": stars,
        "forks_count": forks,
        "watchers_count": watchers,
        "subscribers_count": 1,
        "open_issues_count": 3
    })
}

/// Mounts a successful API response for `repo`
pub async fn mount_repo(server: &MockServer, repo: &str, stars: u64, forks: u64, watchers: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_payload(repo, stars, forks, watchers)))
        .mount(server)
        .await;
}

/// Mounts an error status for `repo`
pub async fn mount_status(server: &MockServer, repo: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}", repo)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a mock that fails the test if `repo` is ever requested
pub async fn mount_never_requested(server: &MockServer, repo: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_payload(repo, 0, 0, 0)))
        .expect(0)
        .mount(server)
        .await;
}
