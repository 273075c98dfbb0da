//! Integration tests for Awesome-Metrics
//!
//! These tests use wiremock to stand in for both the awesome-list page and
//! the repository API, and drive complete scrape and analysis sessions.

mod common;
mod scrape_tests;
