//! Yahoo Finance chart adapter.
//!
//! Queries the v8 chart endpoint for a short daily history and returns the
//! most recent non-null close.

use async_trait::async_trait;
use serde::Deserialize;
use sight_common::config::IpoSourcesConfig;
use tracing::debug;

use super::http::HttpPageFetcher;
use super::provider::{ProviderError, QuoteProvider};

/// History window requested per symbol.
const CHART_RANGE: &str = "5d";

/// Bar interval requested per symbol.
const CHART_INTERVAL: &str = "1d";

// ============================================================================
// Adapter
// ============================================================================

/// Daily close lookups against the Yahoo chart API.
pub struct YahooChartAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartAdapter {
    /// Create with an existing client. `base_url` gets the symbol appended.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Create from configuration, sharing the page fetcher's client.
    pub fn from_config(fetcher: &HttpPageFetcher, sources: &IpoSourcesConfig) -> Self {
        Self::new(fetcher.client().clone(), sources.quote_base_url.clone())
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}{}?range={}&interval={}",
            self.base_url, symbol, CHART_RANGE, CHART_INTERVAL
        )
    }
}

#[async_trait]
impl QuoteProvider for YahooChartAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn latest_close(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        if symbol.is_empty() {
            return Err(ProviderError::InvalidRequest("Empty symbol".into()));
        }

        let url = self.chart_url(symbol);
        debug!(url = %url, symbol = symbol, "Fetching chart");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        parse_latest_close(&body)
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Extract the last non-null close from a chart response body.
///
/// An empty history yields `Ok(None)`. A response carrying an `error`
/// object yields `DataNotAvailable`.
pub fn parse_latest_close(body: &str) -> Result<Option<f64>, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Parse(format!("Failed to parse chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(ProviderError::DataNotAvailable(error.description));
    }

    let close = response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|result| result.indicators.quote.into_iter().next())
        .and_then(|quote| quote.close.into_iter().rev().flatten().next());

    Ok(close)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "7203.T", "currency": "JPY"},
                "timestamp": [1700000000, 1700086400, 1700172800],
                "indicators": {"quote": [{"close": [2501.5, 2512.0, null]}]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_skips_trailing_nulls() {
        assert_eq!(parse_latest_close(CHART).unwrap(), Some(2512.0));
    }

    #[test]
    fn test_parse_empty_history() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert_eq!(parse_latest_close(body).unwrap(), None);

        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert_eq!(parse_latest_close(body).unwrap(), None);
    }

    #[test]
    fn test_parse_error_object() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_latest_close(body).unwrap_err();
        assert!(matches!(err, ProviderError::DataNotAvailable(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_latest_close("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn test_chart_url() {
        let adapter = YahooChartAdapter::new(reqwest::Client::new(), "https://q/chart/");
        assert_eq!(
            adapter.chart_url("7203.T"),
            "https://q/chart/7203.T?range=5d&interval=1d"
        );
    }
}
