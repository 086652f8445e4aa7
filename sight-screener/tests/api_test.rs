//! HTTP API tests.
//!
//! Serves the router on an ephemeral port with fixture-backed sources and
//! drives it with reqwest.

mod common;

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use common::{fixture_pages, test_config, MockQuotes};
use sight_common::config::Config;
use sight_screener::screener::{CandidateService, ScreeningPipeline};
use sight_screener::{build_router, ScreenerState};

async fn spawn_server(dir: &TempDir) -> String {
    let mut config = Config::default();
    config.ipo = test_config(&dir.path().join("ipo_cache.json"));
    let pipeline = ScreeningPipeline::with_sources(
        &config.ipo,
        Arc::new(fixture_pages()),
        Arc::new(MockQuotes::fixture()),
    )
    .unwrap();
    let state = Arc::new(ScreenerState::with_service(
        config,
        CandidateService::new(pipeline),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "sight-screener");
}

#[tokio::test]
async fn test_candidates_then_cache() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let status: Value = client
        .get(format!("{}/api/v1/ipo/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["exists"], false);
    assert_eq!(status["running"], false);

    let fresh: Value = client
        .get(format!("{}/api/v1/ipo/candidates", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fresh["source"], "fresh");
    assert_eq!(fresh["count"], 1);
    assert_eq!(fresh["candidates"][0]["code"], "1111");
    assert_eq!(fresh["funnel"].as_array().unwrap().len(), 7);

    let cached: Value = client
        .get(format!("{}/api/v1/ipo/candidates", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached["source"], "cache");
    assert_eq!(cached["candidates"], fresh["candidates"]);

    let forced: Value = client
        .get(format!("{}/api/v1/ipo/candidates?refresh=true", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(forced["source"], "fresh");
}

#[tokio::test]
async fn test_refresh_and_clear() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let refreshed: Value = client
        .post(format!("{}/api/v1/ipo/refresh", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(refreshed["listings_fetched"], 4);
    assert_eq!(refreshed["count"], 1);
    assert_eq!(refreshed["cache_saved"], true);

    let status: Value = client
        .get(format!("{}/api/v1/ipo/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["valid"], true);
    assert_eq!(status["rows"], 1);

    let cleared: Value = client
        .delete(format!("{}/api/v1/ipo/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["cleared"], true);

    let cleared_again: Value = client
        .delete(format!("{}/api/v1/ipo/cache", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared_again["cleared"], false);
}
