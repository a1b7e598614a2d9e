//! Page fetching
//!
//! This module handles every HTTP request a pagination loop makes:
//! - Building the session's HTTP client from the fetch options
//! - GET requests with a per-request timeout
//! - Mapping every ordinary failure onto a [`FailureReason`]
//!
//! Network trouble never surfaces as an `Err`; it comes back as
//! [`PageResult::Failed`] so the paginator can decide what to do.

use crate::config::FetchOptions;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Connect timeout, independent of the per-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A page that loaded successfully
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Page body content
    pub body: String,
}

/// Why a page could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Request or body read exceeded the timeout
    Timeout,
    /// Connection, DNS, TLS, redirect or HTTP status failure
    Navigation,
    /// The site refused us (403/429 or a challenge page)
    Blocked,
    /// The response was not an HTML/XML document
    ContentMismatch,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Navigation => "navigation",
            FailureReason::Blocked => "blocked",
            FailureReason::ContentMismatch => "content-mismatch",
        }
    }

    /// Blocked pages are never retried
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureReason::Blocked)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub url: Url,
    pub reason: FailureReason,
    /// Human-readable description for logs
    pub detail: String,
}

impl FetchFailure {
    pub fn new(url: &Url, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            url: url.clone(),
            reason,
            detail: detail.into(),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    Loaded(Page),
    Failed(FetchFailure),
}

impl PageResult {
    pub fn is_loaded(&self) -> bool {
        matches!(self, PageResult::Loaded(_))
    }
}

/// Retrieves one page
///
/// Implementations must not retry and must not panic on network trouble.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &Url, options: &FetchOptions) -> PageResult;
}

/// Builds an HTTP client configured from fetch options
///
/// # Arguments
///
/// * `options` - Fetch options (user agent and timeout are used)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::FetchOptions;
/// use listing_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchOptions::default()).unwrap();
/// ```
pub fn build_http_client(options: &FetchOptions) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(options.user_agent.as_str())
        .default_headers(headers)
        .timeout(options.timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(options.timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP session owned by one pagination loop
///
/// The underlying client (and its connection pool) is released when the
/// session is dropped.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    site: String,
}

impl HttpFetcher {
    /// Opens a session for one site's pagination loop
    pub fn open(options: &FetchOptions, site: &str) -> Result<Self, reqwest::Error> {
        if !options.headless {
            warn!(site, "headless = false has no effect on the HTTP fetcher");
        }
        let client = build_http_client(options)?;
        debug!(site, "HTTP session opened");
        Ok(Self {
            client,
            site: site.to_string(),
        })
    }
}

impl Drop for HttpFetcher {
    fn drop(&mut self) {
        debug!(site = %self.site, "HTTP session released");
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a page, classifying every failure
    ///
    /// | Condition                              | Reason             |
    /// |----------------------------------------|--------------------|
    /// | Timeout (request or body)              | `timeout`          |
    /// | Connect / DNS / TLS / redirect error   | `navigation`       |
    /// | HTTP 403, 429                          | `blocked`          |
    /// | Other non-2xx status                   | `navigation`       |
    /// | Content-Type present, not HTML or XML  | `content-mismatch` |
    async fn fetch(&self, target: &Url, options: &FetchOptions) -> PageResult {
        let response = match self
            .client
            .get(target.clone())
            .timeout(options.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PageResult::Failed(classify_error(target, &e)),
        };

        let status = response.status();
        let final_url = response.url().clone();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return PageResult::Failed(FetchFailure::new(
                target,
                FailureReason::Blocked,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        if !status.is_success() {
            return PageResult::Failed(FetchFailure::new(
                target,
                FailureReason::Navigation,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        if let Some(content_type) = content_type {
            if !content_type.contains("html") && !content_type.contains("xml") {
                return PageResult::Failed(FetchFailure::new(
                    target,
                    FailureReason::ContentMismatch,
                    format!("Content-Type {}", content_type),
                ));
            }
        }

        match response.text().await {
            Ok(body) => PageResult::Loaded(Page {
                url: final_url,
                status: status.as_u16(),
                body,
            }),
            Err(e) => PageResult::Failed(classify_error(target, &e)),
        }
    }
}

fn classify_error(target: &Url, error: &reqwest::Error) -> FetchFailure {
    let reason = if error.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Navigation
    };
    FetchFailure::new(target, reason, error.to_string())
}
