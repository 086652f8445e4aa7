//! Market data module for the IPO screener.
//!
//! Scrapes new-listing archives and enriches every listing with live
//! price, capitalization and ownership data. Every source sits behind a
//! trait so markup changes stay local to one extractor.
//!
//! # Data Sources
//! - **JPX archive** (listing tables, two physical rows per listing)
//! - **Yahoo chart API** (latest daily close)
//! - **Capitalization page** (`X億Y万` cells)
//! - **Officer page** (director holdings in `(NN.N%)` form)

mod html;
mod http;
mod listing;
mod market_cap;
mod ownership;
mod price;
mod provider;
mod yahoo;

pub use http::HttpPageFetcher;
pub use listing::{
    parse_listing_date, parse_offer_price, JpxListingTable, ListingFetcher, ListingTableExtractor,
};
pub use market_cap::{parse_market_cap, MarketCapEnricher, MarketCapExtractor, SelectorMarketCap};
pub use ownership::{
    parse_holding_pct, OfficerExtractor, OfficerHolding, OfficerTable, OwnershipClassifier,
    DIRECTOR_MARKER,
};
pub use price::PriceEnricher;
pub use provider::{PageFetcher, ProviderError, QuoteProvider, StaticPageFetcher};
pub use yahoo::{parse_latest_close, YahooChartAdapter};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Width of a Tokyo Stock Exchange instrument code.
pub const CODE_WIDTH: usize = 4;

/// Market suffix the quote provider expects for Tokyo listings.
pub const MARKET_SUFFIX: &str = ".T";

// ============================================================================
// Instrument Codes
// ============================================================================

/// Normalize a scraped instrument code.
///
/// All-digit codes are zero-padded to [`CODE_WIDTH`]; alphanumeric codes
/// (e.g. "130A") are upper-cased. Returns `None` when nothing usable remains.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();

    if code.is_empty() {
        return None;
    }

    if code.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{:0>width$}", code, width = CODE_WIDTH))
    } else {
        Some(code)
    }
}

/// Quote provider symbol for an instrument code (e.g. "7203" -> "7203.T").
pub fn quote_symbol(code: &str) -> String {
    format!("{:0>width$}{}", code, MARKET_SUFFIX, width = CODE_WIDTH)
}

// ============================================================================
// Core Data Types
// ============================================================================

/// One historically listed instrument, as scraped from the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Listing date (annotation stripped)
    pub listing_date: NaiveDate,
    /// Market segment label (e.g. "グロース")
    pub market_segment: String,
    /// Zero-padded instrument code (e.g. "0123", "130A")
    pub instrument_code: String,
    /// Company name
    pub company_name: String,
    /// Offer price in yen, absent when the field was not a plain integer
    pub offer_price: Option<u32>,
}

impl ListingRecord {
    /// Calendar year of the listing.
    pub fn listing_year(&self) -> i32 {
        self.listing_date.year()
    }
}

/// Outcome of a single per-row lookup against an external source.
///
/// Keeps "the source had nothing" apart from "the source could not be
/// reached" so callers can tell no-data from disqualified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    /// A value was extracted
    Found(T),
    /// The source answered but held no matching datum
    Missing,
    /// Fetch or transport failure
    Failed(String),
}

impl<T> Lookup<T> {
    /// The extracted value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Build from a provider result: `Ok(None)` becomes `Missing`.
    pub fn from_result<E: std::fmt::Display>(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(Some(v)) => Self::Found(v),
            Ok(None) => Self::Missing,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self::Missing
    }
}

/// A listing joined with live price, capitalization and ownership data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// The scraped listing
    pub listing: ListingRecord,
    /// Latest daily close, rounded to whole yen
    pub current_price: Lookup<f64>,
    /// Market capitalization in hundred-million yen
    pub market_cap: Lookup<f64>,
    /// Whether a director holds a controlling stake
    pub owner_founder_ceo: Lookup<bool>,
    /// Year derived from the listing date
    pub listing_year: i32,
}

impl EnrichedRecord {
    /// Wrap a listing; all lookups start out as `Missing`.
    pub fn new(listing: ListingRecord) -> Self {
        let listing_year = listing.listing_year();
        Self {
            listing,
            current_price: Lookup::Missing,
            market_cap: Lookup::Missing,
            owner_founder_ceo: Lookup::Missing,
            listing_year,
        }
    }

    pub fn code(&self) -> &str {
        &self.listing.instrument_code
    }

    pub fn offer_price(&self) -> Option<u32> {
        self.listing.offer_price
    }

    pub fn current_price(&self) -> Option<f64> {
        self.current_price.value().copied()
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap.value().copied()
    }

    /// Ownership flag; any lookup failure counts as `false`.
    pub fn is_owner_founder_ceo(&self) -> bool {
        matches!(self.owner_founder_ceo, Lookup::Found(true))
    }
}

/// A screened candidate, projected to the display columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    /// Instrument code
    pub code: String,
    /// Company name
    pub name: String,
    /// Listing date
    pub listing_date: NaiveDate,
    /// Latest close (yen)
    pub current_price: f64,
    /// Offer price (yen)
    pub offer_price: u32,
    /// Market capitalization (hundred-million yen)
    pub market_cap: f64,
}

// ============================================================================
// Tests
// ============================================================================
