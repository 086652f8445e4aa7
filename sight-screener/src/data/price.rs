//! Price enricher: attaches the latest daily close to each listing.

use std::sync::Arc;
use tracing::{debug, info};

use crate::progress::{PipelineEvent, PipelineStage, ProgressReporter};

use super::provider::QuoteProvider;
use super::{quote_symbol, EnrichedRecord, Lookup};

/// Looks up current prices through a [`QuoteProvider`].
pub struct PriceEnricher {
    quotes: Arc<dyn QuoteProvider>,
}

impl PriceEnricher {
    pub fn new(quotes: Arc<dyn QuoteProvider>) -> Self {
        Self { quotes }
    }

    /// Current price for one instrument code, rounded to whole yen
    /// (half to even).
    pub async fn lookup(&self, code: &str) -> Lookup<f64> {
        let symbol = quote_symbol(code);
        let result = self.quotes.latest_close(&symbol).await;
        if let Err(ref e) = result {
            debug!(
                provider = self.quotes.name(),
                symbol = %symbol,
                error = %e,
                "Quote lookup failed"
            );
        }
        Lookup::from_result(result.map(|close| close.map(f64::round_ties_even)))
    }

    /// Populate `current_price` on every record, one request per row.
    ///
    /// Failures leave the price absent; the batch is never aborted.
    pub async fn attach_current_price(
        &self,
        mut records: Vec<EnrichedRecord>,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedRecord> {
        let total = records.len();
        progress.report(&PipelineEvent::StageStarted {
            stage: PipelineStage::Prices,
            total,
        });

        for (index, record) in records.iter_mut().enumerate() {
            let code = record.code().to_string();
            record.current_price = self.lookup(&code).await;
            progress.report(&PipelineEvent::RowEnriched {
                stage: PipelineStage::Prices,
                index,
                total,
                code,
                found: record.current_price.is_found(),
            });
        }

        let priced = records.iter().filter(|r| r.current_price.is_found()).count();
        info!(
            provider = self.quotes.name(),
            priced,
            total = records.len(),
            "Price enrichment complete"
        );
        progress.report(&PipelineEvent::StageFinished {
            stage: PipelineStage::Prices,
            rows: total,
        });
        records
    }
}
