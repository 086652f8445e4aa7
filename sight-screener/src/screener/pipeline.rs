//! Screening pipeline orchestrator.
//!
//! Runs the stages strictly forward, one row at a time:
//!
//! ```text
//! listings -> prices -> market caps -> ownership -> filter -> cache
//! ```
//!
//! Per-row failures are absorbed by the enrichers; a run always produces a
//! (possibly empty) result.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use sight_common::config::IpoConfig;
use std::sync::Arc;
use tracing::{info, warn};

use crate::data::{
    CandidateRow, EnrichedRecord, HttpPageFetcher, JpxListingTable, ListingFetcher,
    MarketCapEnricher, OfficerTable, OwnershipClassifier, PageFetcher, PriceEnricher,
    ProviderError, QuoteProvider, YahooChartAdapter,
};
use crate::progress::{PipelineEvent, PipelineStage, ProgressReporter};

use super::cache::CacheStore;
use super::filter::{FilterResult, ScreeningFilter};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningRun {
    /// Rows passing every filter
    pub rows: Vec<CandidateRow>,
    /// Per-predicate funnel; empty when no listings were fetched
    pub funnel: Vec<FilterResult>,
    /// Listings scraped from the archive
    pub listings_fetched: usize,
    /// Whether the rows reached the cache
    pub cache_saved: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ScreeningRun {
    /// Wall time of the run in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Wires the stages together.
pub struct ScreeningPipeline {
    listings: ListingFetcher,
    prices: PriceEnricher,
    market_caps: MarketCapEnricher,
    ownership: OwnershipClassifier,
    filter: ScreeningFilter,
    cache: CacheStore,
    max_years: usize,
}

impl ScreeningPipeline {
    /// Build with live HTTP sources.
    pub fn from_config(config: &IpoConfig) -> Result<Self, ProviderError> {
        let http = HttpPageFetcher::from_config(&config.sources)?;
        let quotes = YahooChartAdapter::from_config(&http, &config.sources);
        Self::with_sources(config, Arc::new(http), Arc::new(quotes))
    }

    /// Build with injected sources; every page-scraping stage shares `pages`.
    pub fn with_sources(
        config: &IpoConfig,
        pages: Arc<dyn PageFetcher>,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Result<Self, ProviderError> {
        let sources = &config.sources;

        Ok(Self {
            listings: ListingFetcher::new(
                pages.clone(),
                Box::new(JpxListingTable::default()),
                sources.archive_urls(),
            ),
            prices: PriceEnricher::new(quotes),
            market_caps: MarketCapEnricher::from_config(pages.clone(), sources)?,
            ownership: OwnershipClassifier::new(
                pages,
                Box::new(OfficerTable),
                sources.officers_url_template.clone(),
                config.filters.min_director_holding_pct,
            ),
            filter: ScreeningFilter::new(config.filters.clone()),
            cache: CacheStore::new(&config.cache.path),
            max_years: config.filters.max_archive_years,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run every stage and save the result.
    pub async fn run_detailed(&self, progress: &dyn ProgressReporter) -> ScreeningRun {
        let started_at = Utc::now();
        info!(max_years = self.max_years, "Starting IPO screening run");

        progress.report(&PipelineEvent::StageStarted {
            stage: PipelineStage::Listings,
            total: 0,
        });
        let listings = self.listings.fetch_listings(self.max_years).await;
        let listings_fetched = listings.len();
        progress.report(&PipelineEvent::StageFinished {
            stage: PipelineStage::Listings,
            rows: listings_fetched,
        });

        if listings.is_empty() {
            warn!("No listings fetched, skipping enrichment");
            progress.report(&PipelineEvent::Finished { candidates: 0 });
            return ScreeningRun {
                rows: Vec::new(),
                funnel: Vec::new(),
                listings_fetched,
                cache_saved: false,
                started_at,
                completed_at: Utc::now(),
            };
        }

        let records: Vec<EnrichedRecord> = listings.into_iter().map(EnrichedRecord::new).collect();
        let records = self.prices.attach_current_price(records, progress).await;
        let records = self.market_caps.attach_market_cap(records, progress).await;
        let records = self.ownership.attach_ownership(records, progress).await;

        progress.report(&PipelineEvent::StageStarted {
            stage: PipelineStage::Filter,
            total: records.len(),
        });
        let (rows, funnel) = self
            .filter
            .filter_candidates_at(records, Local::now().date_naive());
        progress.report(&PipelineEvent::StageFinished {
            stage: PipelineStage::Filter,
            rows: rows.len(),
        });

        let cache_saved = match self.cache.try_save(&rows) {
            Ok(()) => {
                progress.report(&PipelineEvent::CacheSaved { rows: rows.len() });
                true
            }
            Err(e) => {
                warn!(
                    path = %self.cache.path().display(),
                    error = %e,
                    "Failed to save screening cache"
                );
                progress.report(&PipelineEvent::CacheSaveFailed {
                    reason: e.to_string(),
                });
                false
            }
        };

        let run = ScreeningRun {
            rows,
            funnel,
            listings_fetched,
            cache_saved,
            started_at,
            completed_at: Utc::now(),
        };

        info!(
            listings = listings_fetched,
            candidates = run.rows.len(),
            cache_saved,
            duration_secs = run.duration_secs(),
            "IPO screening run complete"
        );
        progress.report(&PipelineEvent::Finished {
            candidates: run.rows.len(),
        });
        run
    }

    /// Run every stage and return only the screened rows.
    pub async fn run_screening(&self, progress: &dyn ProgressReporter) -> Vec<CandidateRow> {
        self.run_detailed(progress).await.rows
    }
}
