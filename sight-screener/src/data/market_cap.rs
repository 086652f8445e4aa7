//! Market capitalization enricher.
//!
//! Capitalization pages print the value in Japanese units, e.g. "1,234億5,678万円".
//! Values are returned in hundred-million yen (億), fractional.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use sight_common::config::{code_url, IpoSourcesConfig};
use std::sync::Arc;
use tracing::{debug, info};

use crate::progress::{PipelineEvent, PipelineStage, ProgressReporter};

use super::html::{element_text, fold_fullwidth};
use super::provider::{PageFetcher, ProviderError};
use super::{EnrichedRecord, Lookup};

static OKU_MAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+)億(?:([0-9]+)万)?").expect("Failed to compile market cap regex")
});

/// Parse an `<a>億[<b>万]` string into `a + b / 10000`.
///
/// Full-width digits are read as ASCII and thousands separators are ignored.
/// Returns `None` when nothing matches.
pub fn parse_market_cap(text: &str) -> Option<f64> {
    let cleaned: String = fold_fullwidth(text).chars().filter(|c| *c != ',').collect();
    let caps = OKU_MAN.captures(&cleaned)?;

    let oku: f64 = caps.get(1)?.as_str().parse().ok()?;
    let man: f64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };

    Some(oku + man / 10_000.0)
}

// ============================================================================
// Extractor
// ============================================================================

/// Finds the capitalization on a page.
pub trait MarketCapExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<f64>;
}

/// Scans the cells matched by a CSS selector; the first parsable one wins.
#[derive(Debug, Clone)]
pub struct SelectorMarketCap {
    selector: Selector,
}

impl SelectorMarketCap {
    pub fn new(css: &str) -> Result<Self, ProviderError> {
        let selector = Selector::parse(css).map_err(|e| {
            ProviderError::InvalidRequest(format!("Invalid market cap selector {:?}: {:?}", css, e))
        })?;
        Ok(Self { selector })
    }
}

impl MarketCapExtractor for SelectorMarketCap {
    fn extract(&self, html: &str) -> Option<f64> {
        let document = Html::parse_document(html);
        document
            .select(&self.selector)
            .find_map(|cell| parse_market_cap(&element_text(&cell)))
    }
}

// ============================================================================
// Enricher
// ============================================================================

/// Looks up market capitalization per instrument code.
pub struct MarketCapEnricher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn MarketCapExtractor>,
    url_template: String,
}

impl MarketCapEnricher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Box<dyn MarketCapExtractor>,
        url_template: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            url_template: url_template.into(),
        }
    }

    /// Create with the selector-based extractor from configuration.
    pub fn from_config(
        fetcher: Arc<dyn PageFetcher>,
        sources: &IpoSourcesConfig,
    ) -> Result<Self, ProviderError> {
        let extractor = SelectorMarketCap::new(&sources.market_cap_selector)?;
        Ok(Self::new(
            fetcher,
            Box::new(extractor),
            sources.market_cap_url_template.clone(),
        ))
    }

    /// Capitalization lookup with the failure reason preserved.
    pub async fn lookup(&self, code: &str) -> Lookup<f64> {
        let url = code_url(&self.url_template, code);
        let result = self
            .fetcher
            .fetch(&url)
            .await
            .map(|html| self.extractor.extract(&html));

        if let Err(ref e) = result {
            debug!(code = code, error = %e, "Market cap fetch failed");
        }
        Lookup::from_result(result)
    }

    /// Capitalization in hundred-million yen, `None` on any miss.
    pub async fn fetch_market_cap(&self, code: &str) -> Option<f64> {
        self.lookup(code).await.value().copied()
    }

    /// Populate `market_cap` on every record, one request per row.
    pub async fn attach_market_cap(
        &self,
        mut records: Vec<EnrichedRecord>,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedRecord> {
        let total = records.len();
        progress.report(&PipelineEvent::StageStarted {
            stage: PipelineStage::MarketCaps,
            total,
        });

        for (index, record) in records.iter_mut().enumerate() {
            let code = record.code().to_string();
            record.market_cap = self.lookup(&code).await;
            progress.report(&PipelineEvent::RowEnriched {
                stage: PipelineStage::MarketCaps,
                index,
                total,
                code,
                found: record.market_cap.is_found(),
            });
        }

        let found = records.iter().filter(|r| r.market_cap.is_found()).count();
        info!(found, total, "Market cap enrichment complete");
        progress.report(&PipelineEvent::StageFinished {
            stage: PipelineStage::MarketCaps,
            rows: total,
        });
        records
    }
}

// ============================================================================
// Tests
// ============================================================================
