//! `reqwest`-backed page fetcher.

use async_trait::async_trait;
use sight_common::config::IpoSourcesConfig;
use std::time::Duration;
use tracing::debug;

use super::provider::{PageFetcher, ProviderError};

/// Fetches pages over HTTP(S) with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create from the pipeline source configuration.
    pub fn from_config(sources: &IpoSourcesConfig) -> Result<Self, ProviderError> {
        Self::new(
            Duration::from_secs(sources.request_timeout_secs),
            &sources.user_agent,
        )
    }

    /// Shared client, reused by the quote adapter.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ProviderError> {
        debug!(url = %url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to read body: {}", e)))
    }
}
