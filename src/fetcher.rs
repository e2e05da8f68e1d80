//! HTTP transport.
//!
//! One shared blocking-free reqwest client behind the [`PageFetcher`]
//! trait so the orchestrator can run against canned pages in tests.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Per-request timeout, covering connect through body read.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Sent on every request; the IDOT servers reject obviously non-browser
/// agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Transport-level failure for a single page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP Error {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(reqwest::StatusCode),
    #[error("Fetch Error: {0}")]
    Request(String),
}

/// Fetches one page as text. Implemented by the real HTTP client and by
/// test stubs.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// The production fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))
    }
}
