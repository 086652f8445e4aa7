//! Integration tests for the reqwest-backed sources against a mock server.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sight_screener::data::{
    HttpPageFetcher, PageFetcher, PriceEnricher, ProviderError, QuoteProvider, YahooChartAdapter,
};
use sight_screener::Lookup;
use std::sync::Arc;

fn fetcher() -> HttpPageFetcher {
    HttpPageFetcher::new(Duration::from_secs(5), "sight-screener-test").unwrap()
}

#[tokio::test]
async fn test_page_fetch_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listing/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(&server)
        .await;

    let body = fetcher()
        .fetch(&format!("{}/listing/index.html", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<table></table>");
}

#[tokio::test]
async fn test_page_fetch_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/listing/index.html", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 503, .. }));
}

#[tokio::test]
async fn test_chart_adapter_latest_close() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chart/7203.T"))
        .and(query_param("range", "5d"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[2890.0,2911.5,null]}]}}],"error":null}}"#,
        ))
        .mount(&server)
        .await;

    let adapter = YahooChartAdapter::new(
        fetcher().client().clone(),
        format!("{}/chart/", server.uri()),
    );
    assert_eq!(adapter.latest_close("7203.T").await.unwrap(), Some(2911.5));

    let enricher = PriceEnricher::new(Arc::new(adapter));
    assert_eq!(enricher.lookup("7203").await, Lookup::Found(2912.0));
}

#[tokio::test]
async fn test_chart_adapter_unknown_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        ))
        .mount(&server)
        .await;

    let adapter = YahooChartAdapter::new(
        fetcher().client().clone(),
        format!("{}/chart/", server.uri()),
    );
    let err = adapter.latest_close("0000.T").await.unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 404, .. }));

    let enricher = PriceEnricher::new(Arc::new(adapter));
    assert!(enricher.lookup("0000").await.is_failed());
}
