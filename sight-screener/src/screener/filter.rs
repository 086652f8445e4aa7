//! Screening filter for enriched listings.
//!
//! Applies seven predicates in a fixed order and records a funnel of how
//! many rows each one eliminated:
//! 1. Listing age: listed within the last N calendar years
//! 2. Offer price present
//! 3. Current price present
//! 4. Trading below the offer price
//! 5. Market cap present
//! 6. Market cap within bounds
//! 7. Owner-led
//!
//! The order only affects the funnel figures, never the result set.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sight_common::config::IpoFilterConfig;
use tracing::debug;

use crate::data::{CandidateRow, EnrichedRecord};

// ============================================================================
// Filter Stage
// ============================================================================

/// One screening predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    /// listing_year >= current_year - max_listing_age_years
    ListingAge,
    /// offer_price is present
    OfferPrice,
    /// current_price is present
    CurrentPrice,
    /// current_price < offer_price
    BelowOffer,
    /// market_cap is present and finite
    MarketCap,
    /// min_market_cap <= market_cap <= max_market_cap
    MarketCapRange,
    /// A director holds a controlling stake
    OwnerLed,
}

impl FilterStage {
    /// Every stage, in application order.
    pub const ALL: [FilterStage; 7] = [
        Self::ListingAge,
        Self::OfferPrice,
        Self::CurrentPrice,
        Self::BelowOffer,
        Self::MarketCap,
        Self::MarketCapRange,
        Self::OwnerLed,
    ];
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListingAge => write!(f, "上場年数"),
            Self::OfferPrice => write!(f, "公開価格あり"),
            Self::CurrentPrice => write!(f, "現在値あり"),
            Self::BelowOffer => write!(f, "公開価格割れ"),
            Self::MarketCap => write!(f, "時価総額あり"),
            Self::MarketCapRange => write!(f, "時価総額レンジ"),
            Self::OwnerLed => write!(f, "オーナー経営"),
        }
    }
}

// ============================================================================
// Filter Result
// ============================================================================

/// Result of a filtering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Stage name
    pub stage: FilterStage,
    /// Number of rows that passed this stage
    pub passed: usize,
    /// Number of rows eliminated at this stage
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl FilterResult {
    pub fn new(stage: FilterStage, input_count: usize, passed_count: usize) -> Self {
        let eliminated = input_count.saturating_sub(passed_count);
        let elimination_rate = if input_count > 0 {
            (eliminated as f64 / input_count as f64) * 100.0
        } else {
            0.0
        };

        Self {
            stage,
            passed: passed_count,
            eliminated,
            elimination_rate,
        }
    }
}

// ============================================================================
// Screening Filter
// ============================================================================

/// Conjunction of the screening predicates.
#[derive(Debug, Clone)]
pub struct ScreeningFilter {
    config: IpoFilterConfig,
}

impl ScreeningFilter {
    pub fn new(config: IpoFilterConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(IpoFilterConfig::default())
    }

    pub fn config(&self) -> &IpoFilterConfig {
        &self.config
    }

    /// Whether a row passes one predicate, evaluated as of `today`.
    pub fn passes(&self, stage: FilterStage, record: &EnrichedRecord, today: NaiveDate) -> bool {
        match stage {
            FilterStage::ListingAge => {
                record.listing_year >= today.year() - self.config.max_listing_age_years
            }
            FilterStage::OfferPrice => record.offer_price().is_some(),
            FilterStage::CurrentPrice => record.current_price().is_some(),
            FilterStage::BelowOffer => match (record.current_price(), record.offer_price()) {
                (Some(current), Some(offer)) => current < f64::from(offer),
                _ => false,
            },
            FilterStage::MarketCap => record.market_cap().map_or(false, f64::is_finite),
            FilterStage::MarketCapRange => record.market_cap().map_or(false, |cap| {
                (self.config.min_market_cap..=self.config.max_market_cap).contains(&cap)
            }),
            FilterStage::OwnerLed => record.is_owner_founder_ceo(),
        }
    }

    /// Whether a row passes every predicate.
    pub fn passes_all(&self, record: &EnrichedRecord, today: NaiveDate) -> bool {
        FilterStage::ALL
            .iter()
            .all(|stage| self.passes(*stage, record, today))
    }

    /// Keep the rows passing every predicate, with the per-stage funnel.
    ///
    /// Input order is preserved.
    pub fn retain_passing(
        &self,
        rows: Vec<EnrichedRecord>,
        today: NaiveDate,
    ) -> (Vec<EnrichedRecord>, Vec<FilterResult>) {
        let mut remaining = rows;
        let mut funnel = Vec::with_capacity(FilterStage::ALL.len());

        for stage in FilterStage::ALL {
            let input_count = remaining.len();
            remaining.retain(|record| self.passes(stage, record, today));
            let result = FilterResult::new(stage, input_count, remaining.len());
            debug!(
                stage = %stage,
                passed = result.passed,
                eliminated = result.eliminated,
                "Filter stage applied"
            );
            funnel.push(result);
        }

        (remaining, funnel)
    }

    /// Screen enriched rows as of `today` and project them to display rows.
    pub fn filter_candidates_at(
        &self,
        rows: Vec<EnrichedRecord>,
        today: NaiveDate,
    ) -> (Vec<CandidateRow>, Vec<FilterResult>) {
        let (passing, funnel) = self.retain_passing(rows, today);
        let candidates = passing.iter().filter_map(to_candidate).collect();
        (candidates, funnel)
    }

    /// Screen enriched rows as of the local date.
    pub fn filter_candidates(&self, rows: Vec<EnrichedRecord>) -> Vec<CandidateRow> {
        self.filter_candidates_at(rows, Local::now().date_naive()).0
    }
}

/// Project a row that passed the filter onto the display columns.
fn to_candidate(record: &EnrichedRecord) -> Option<CandidateRow> {
    Some(CandidateRow {
        code: record.code().to_string(),
        name: record.listing.company_name.clone(),
        listing_date: record.listing.listing_date,
        current_price: record.current_price()?,
        offer_price: record.offer_price()?,
        market_cap: record.market_cap()?,
    })
}

// ============================================================================
// Tests
// ============================================================================
