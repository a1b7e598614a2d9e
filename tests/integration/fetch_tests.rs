//! Failure classification of the HTTP fetcher against a mock server

use crate::common::html;
use listing_harvest::config::FetchOptions;
use listing_harvest::crawler::{FailureReason, Fetcher, HttpFetcher, PageResult};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> FetchOptions {
    FetchOptions {
        timeout: Duration::from_millis(500),
        ..FetchOptions::default()
    }
}

async fn fetch(server: &MockServer, route: &str) -> PageResult {
    let fetcher = HttpFetcher::open(&options(), "mock").unwrap();
    let url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
    fetcher.fetch(&url, &options()).await
}

fn reason(result: PageResult) -> FailureReason {
    match result {
        PageResult::Failed(failure) => failure.reason,
        PageResult::Loaded(page) => panic!("expected a failure, got page {}", page.url),
    }
}

#[tokio::test]
async fn test_loaded_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>hello</p>"))
        .mount(&server)
        .await;

    match fetch(&server, "/ok").await {
        PageResult::Loaded(page) => {
            assert_eq!(page.status, 200);
            assert!(page.body.contains("hello"));
            assert!(page.url.as_str().ends_with("/ok"));
        }
        PageResult::Failed(failure) => panic!("unexpected failure: {:?}", failure),
    }
}

#[tokio::test]
async fn test_missing_content_type_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<p>bare</p>".to_vec()))
        .mount(&server)
        .await;

    assert!(fetch(&server, "/bare").await.is_loaded());
}

#[tokio::test]
async fn test_forbidden_and_rate_limited_are_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow-down"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    assert_eq!(reason(fetch(&server, "/forbidden").await), FailureReason::Blocked);
    assert_eq!(reason(fetch(&server, "/slow-down").await), FailureReason::Blocked);
}

#[tokio::test]
async fn test_other_statuses_are_navigation_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert_eq!(reason(fetch(&server, "/broken").await), FailureReason::Navigation);
    assert_eq!(reason(fetch(&server, "/unmocked").await), FailureReason::Navigation);
}

#[tokio::test]
async fn test_non_html_is_content_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&server)
        .await;

    assert_eq!(reason(fetch(&server, "/data").await), FailureReason::ContentMismatch);
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    assert_eq!(reason(fetch(&server, "/slow").await), FailureReason::Timeout);
}

#[tokio::test]
async fn test_connection_refused_is_navigation() {
    let fetcher = HttpFetcher::open(&options(), "nowhere").unwrap();
    let url = Url::parse("http://127.0.0.1:9/").unwrap();

    assert_eq!(reason(fetcher.fetch(&url, &options()).await), FailureReason::Navigation);
}
