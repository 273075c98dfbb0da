//! Scrape session tests against mock page and API servers

use crate::common::{
    mount_never_requested, mount_page, mount_repo, mount_status, repo_payload, test_config,
    test_options, PAGE_PATH,
};
use awesome_metrics::crawler::{run_scrape, ExplicitToken, NoToken, SessionOutcome};
use awesome_metrics::{load_dataset, save_dataset, AwesomeError, MetricsRecord, RepositoryReference};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn names(records: &[MetricsRecord]) -> Vec<String> {
    records.iter().map(|r| r.repository.to_string()).collect()
}

#[tokio::test]
async fn test_full_scrape_writes_dataset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two", "a/one", "c/three"]).await;
    mount_repo(&server, "a/one", 100, 10, 5).await;
    mount_repo(&server, "b/two", 200, 20, 6).await;
    mount_repo(&server, "c/three", 300, 30, 7).await;

    let config = test_config(&server, 5);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.discovered, 3);
    assert_eq!(report.collected, 3);
    assert_eq!(report.failures.total(), 0);

    let records = load_dataset(&output).expect("Failed to load dataset");
    assert_eq!(names(&records), vec!["a/one", "b/two", "c/three"]);
    assert_eq!(
        records[1],
        MetricsRecord {
            repository: RepositoryReference::new("b", "two"),
            url: "https://github.com/b/two".to_string(),
            stars: 200,
            forks: 20,
            watchers: 6,
        }
    );
}

#[tokio::test]
async fn test_failure_counter_resets_on_success() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    // Two failures, a success, then a run that alone reaches the threshold
    mount_page(
        &server,
        &["x/f1", "x/f2", "x/ok", "x/f3", "x/f4", "x/f5", "x/never"],
    )
    .await;
    for repo in ["x/f1", "x/f2", "x/f3", "x/f4", "x/f5"] {
        mount_status(&server, repo, 404).await;
    }
    mount_repo(&server, "x/ok", 42, 1, 1).await;
    mount_never_requested(&server, "x/never").await;

    let config = test_config(&server, 3);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(
        report.outcome,
        SessionOutcome::AbortedFailures {
            consecutive_failures: 3
        }
    );
    assert_eq!(report.failures.not_found, 5);
    assert_eq!(report.collected, 1);

    let records = load_dataset(&output).expect("Failed to load dataset");
    assert_eq!(names(&records), vec!["x/ok"]);
}

#[tokio::test]
async fn test_interleaved_failures_do_not_abort() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["x/f1", "x/ok1", "x/f2", "x/ok2"]).await;
    mount_status(&server, "x/f1", 500).await;
    mount_status(&server, "x/f2", 404).await;
    mount_repo(&server, "x/ok1", 1, 1, 1).await;
    mount_repo(&server, "x/ok2", 2, 2, 2).await;

    let config = test_config(&server, 2);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.failures.transient, 1);
    assert_eq!(report.failures.not_found, 1);
    assert_eq!(names(&load_dataset(&output).unwrap()), vec!["x/ok1", "x/ok2"]);
}

#[tokio::test]
async fn test_auth_rejection_aborts_and_persists() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two", "c/three"]).await;
    mount_repo(&server, "a/one", 1, 1, 1).await;
    mount_status(&server, "b/two", 401).await;
    mount_never_requested(&server, "c/three").await;

    let config = test_config(&server, 5);
    let token = ExplicitToken::new(Some("expired-token"));
    let report = run_scrape(&config, &test_options(&server, &output), &token)
        .await
        .expect("Scrape failed");

    assert!(matches!(
        report.outcome,
        SessionOutcome::AbortedFatal { ref reason } if reason.contains("HTTP 401")
    ));
    // Authentication failures are not tallied
    assert_eq!(report.failures.total(), 0);
    assert_eq!(names(&load_dataset(&output).unwrap()), vec!["a/one"]);
}

#[tokio::test]
async fn test_token_sent_as_bearer() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_payload("a/one", 9, 9, 9)))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server, 5);
    let token = ExplicitToken::new(Some("secret-token"));
    let report = run_scrape(&config, &test_options(&server, &output), &token)
        .await
        .expect("Scrape failed");

    assert_eq!(report.collected, 1);
}

#[tokio::test]
async fn test_rate_limit_retried_after_reset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_repo(&server, "a/one", 5, 5, 5).await;

    let mut config = test_config(&server, 5);
    config.scraper.rate_limit_max_wait_secs = 5;
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.failures.rate_limited, 0);
    assert_eq!(report.collected, 1);
}

#[tokio::test]
async fn test_rate_limit_counts_as_failure_without_wait() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(1)
        .mount(&server)
        .await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let config = test_config(&server, 5);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.failures.rate_limited, 1);
    assert_eq!(names(&load_dataset(&output).unwrap()), vec!["b/two"]);
}

#[tokio::test]
async fn test_malformed_response_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let config = test_config(&server, 5);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.failures.malformed, 1);
    assert_eq!(report.collected, 1);
}

#[tokio::test]
async fn test_resume_skips_collected_repositories() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    let earlier = MetricsRecord {
        repository: RepositoryReference::new("a", "one"),
        url: "https://github.com/a/one".to_string(),
        stars: 1,
        forks: 1,
        watchers: 1,
    };
    save_dataset(&output, &[earlier.clone()]).expect("Failed to seed dataset");

    mount_page(&server, &["a/one", "b/two"]).await;
    mount_never_requested(&server, "a/one").await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let config = test_config(&server, 5);
    let mut options = test_options(&server, &output);
    options.resume = true;
    let report = run_scrape(&config, &options, &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.skipped, 1);
    assert_eq!(report.collected, 2);

    let records = load_dataset(&output).unwrap();
    assert_eq!(records[0], earlier);
    assert_eq!(names(&records), vec!["a/one", "b/two"]);
}

#[tokio::test]
async fn test_without_resume_existing_dataset_is_replaced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    save_dataset(
        &output,
        &[MetricsRecord {
            repository: RepositoryReference::new("old", "entry"),
            url: "https://github.com/old/entry".to_string(),
            stars: 1,
            forks: 1,
            watchers: 1,
        }],
    )
    .unwrap();

    mount_page(&server, &["b/two"]).await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let config = test_config(&server, 5);
    run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(names(&load_dataset(&output).unwrap()), vec!["b/two"]);
}

#[tokio::test]
async fn test_page_without_repositories_writes_empty_dataset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &[]).await;

    let config = test_config(&server, 5);
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.discovered, 0);

    let content = std::fs::read_to_string(&output).expect("Dataset not written");
    assert_eq!(content.trim(), "[]");
}

#[tokio::test]
async fn test_source_page_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server, 5);
    let result = run_scrape(&config, &test_options(&server, &output), &NoToken).await;

    assert!(matches!(result, Err(AwesomeError::SourcePage { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_record_keeps_page_link() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul>
                <li><a href="http://www.github.com/BurntSushi/ripgrep.git">ripgrep</a></li>
                <li><a href="https://github.com/BurntSushi/ripgrep">ripgrep again</a></li>
            </ul>"#,
        ))
        .mount(&server)
        .await;
    mount_repo(&server, "BurntSushi/ripgrep", 50, 2, 50).await;

    let config = test_config(&server, 5);
    run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    let records = load_dataset(&output).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "http://www.github.com/BurntSushi/ripgrep.git");
}

#[tokio::test]
async fn test_exhausted_budget_after_success_waits_for_reset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(repo_payload("a/one", 1, 1, 1))
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let mut config = test_config(&server, 5);
    config.scraper.rate_limit_max_wait_secs = 5;
    let report = run_scrape(&config, &test_options(&server, &output), &NoToken)
        .await
        .expect("Scrape failed");

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(names(&load_dataset(&output).unwrap()), vec!["a/one", "b/two"]);
}

#[tokio::test]
async fn test_reset_beyond_wait_budget_does_not_sleep() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("awesome.json");

    mount_page(&server, &["a/one", "b/two"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/a/one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(repo_payload("a/one", 1, 1, 1))
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "3600"),
        )
        .mount(&server)
        .await;
    mount_repo(&server, "b/two", 2, 2, 2).await;

    let mut config = test_config(&server, 5);
    config.scraper.rate_limit_max_wait_secs = 5;
    let options = test_options(&server, &output);
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        run_scrape(&config, &options, &NoToken),
    )
    .await
    .expect("Scrape slept past the wait budget")
    .expect("Scrape failed");

    assert_eq!(report.collected, 2);
}
