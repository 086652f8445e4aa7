//! Sight Screener - IPO candidate screening for the StockSight advisor.
//!
//! Scrapes the exchange's new-listing archive, enriches every listing with
//! price, capitalization and ownership data, and keeps the companies that
//! trade below their offer price under an owner-founder.
//!
//! # Surfaces
//!
//! - HTTP API (`serve`), consumed by the advisor UI
//! - CLI (`screen`, `cache`)

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod progress;
pub mod routes;
pub mod screener;

use anyhow::Result;
use axum::{routing::get, Router};
use sight_common::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::screener::{CandidateService, ScreeningPipeline};

pub use data::{CandidateRow, EnrichedRecord, ListingRecord, Lookup};
pub use progress::{NoopProgress, PipelineEvent, PipelineStage, ProgressReporter, TracingProgress};
pub use screener::{CandidateReport, ReportFormat, ScreeningRun};

/// Shared state for the HTTP handlers.
pub struct ScreenerState {
    /// Configuration
    pub config: Config,
    /// Cached-or-fresh candidate access
    pub service: CandidateService,
}

impl ScreenerState {
    /// Build the live pipeline from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let pipeline = ScreeningPipeline::from_config(&config.ipo)?;
        Ok(Self::with_service(config, CandidateService::new(pipeline)))
    }

    pub fn with_service(config: Config, service: CandidateService) -> Self {
        Self { config, service }
    }
}

/// Build the API router.
pub fn build_router(state: Arc<ScreenerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/ipo/candidates", get(routes::get_candidates))
        .route("/api/v1/ipo/refresh", axum::routing::post(routes::refresh))
        .route(
            "/api/v1/ipo/cache",
            get(routes::cache_status).delete(routes::clear_cache),
        )
        .with_state(state)
        .layer(cors)
}

pub struct ScreenerService {
    state: Arc<ScreenerState>,
}

impl ScreenerService {
    pub fn new(config: Config) -> Result<Self> {
        let state = Arc::new(ScreenerState::new(config)?);
        Ok(Self { state })
    }

    /// Serve the HTTP API until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let server = &self.state.config.server;
        let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

        let app = build_router(self.state.clone());

        tracing::info!(address = %addr, "Starting HTTP server");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
