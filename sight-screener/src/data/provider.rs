//! Source abstraction for scraped pages and price quotes.
//!
//! Defines the `PageFetcher` and `QuoteProvider` traits every source
//! implements, so the pipeline never talks to `reqwest` directly and tests
//! can inject canned HTML.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors raised by page fetchers and quote providers.
///
/// Enrichers absorb these into a per-row [`Lookup`](super::Lookup); they
/// never escape a pipeline stage.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The source has no data for the requested instrument
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    /// Invalid request parameters (bad symbol, bad selector)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// ============================================================================
// Page Fetcher
// ============================================================================

/// Fetches an HTML page by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page body. One attempt, no retries.
    async fn fetch(&self, url: &str) -> Result<String, ProviderError>;
}

/// In-memory fetcher serving canned pages keyed by URL.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<String, String>,
    requests: AtomicUsize,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page body for a URL.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Number of fetches served so far, including misses.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ProviderError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.pages.get(url).cloned().ok_or_else(|| ProviderError::Http {
            status: 404,
            url: url.to_string(),
        })
    }
}

// ============================================================================
// Quote Provider
// ============================================================================

/// Looks up daily closing prices.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider name for logging (e.g., "yahoo")
    fn name(&self) -> &'static str;

    /// Most recent daily close for a provider symbol (e.g., "7203.T").
    ///
    /// `Ok(None)` means the provider answered with an empty history.
    async fn latest_close(&self, symbol: &str) -> Result<Option<f64>, ProviderError>;
}

// ============================================================================
// Tests
// ============================================================================
