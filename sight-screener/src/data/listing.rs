//! Listing fetcher for the exchange's new-listing archive.
//!
//! Each archive page holds one table in which a single listing spans two
//! physical rows: the primary row carries date, company and code, the
//! secondary row carries the market segment and the offer price range.

use chrono::NaiveDate;
use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::html::{cell_texts, first_table, rows};
use super::provider::PageFetcher;
use super::{normalize_code, ListingRecord};

/// Delimiters separating the lower and upper bound of a price range.
const RANGE_DELIMITERS: &[char] = &['～', '〜', '~', '-'];

/// Thousands separators stripped before integer coercion.
const THOUSANDS_SEPARATORS: &[char] = &[',', '，'];

/// Characters that start a trailing annotation after the date.
const ANNOTATION_STARTS: &[char] = &['(', '（', '[', '［', ' '];

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%Y年%m月%d日", "%Y.%m.%d"];

// ============================================================================
// Field Parsing
// ============================================================================

/// Extract the offer price from a price field.
///
/// A range ("1,200～1,500") yields its upper bound. The result is an integer
/// only when every remaining character is a digit once thousands separators
/// are removed; anything else yields `None`.
pub fn parse_offer_price(field: &str) -> Option<u32> {
    let field = field.trim();
    let upper = match field.rfind(RANGE_DELIMITERS) {
        Some(idx) => {
            let delimiter_len = field[idx..].chars().next().map_or(1, char::len_utf8);
            &field[idx + delimiter_len..]
        }
        None => field,
    };

    let digits: String = upper
        .trim()
        .chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Parse a listing date, dropping any trailing annotation.
///
/// Accepts "2024/03/28", "2024-03-28", "2024年3月28日" and "2024.03.28",
/// optionally followed by e.g. "（承認日：2024/02/20）".
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = match text.find(ANNOTATION_STARTS) {
        Some(idx) => &text[..idx],
        None => text,
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

// ============================================================================
// Row Extractor
// ============================================================================

/// Turns one archive page into listing records.
pub trait ListingTableExtractor: Send + Sync {
    /// Parse a page. `None` when the page has no listing table at all;
    /// unparsable rows are dropped silently.
    fn extract(&self, html: &str) -> Option<Vec<ListingRecord>>;
}

/// Positional extractor for the JPX new-listing table.
#[derive(Debug, Clone)]
pub struct JpxListingTable {
    /// Header rows skipped before the first listing
    pub header_rows: usize,
    /// Primary row: listing date cell
    pub date_cell: usize,
    /// Primary row: company name cell
    pub name_cell: usize,
    /// Primary row: instrument code cell
    pub code_cell: usize,
    /// Secondary row: market segment cell
    pub segment_cell: usize,
    /// Secondary row: price range cell
    pub price_cell: usize,
}

impl Default for JpxListingTable {
    fn default() -> Self {
        Self {
            header_rows: 2,
            date_cell: 0,
            name_cell: 1,
            code_cell: 2,
            segment_cell: 0,
            price_cell: 1,
        }
    }
}

impl JpxListingTable {
    /// Build a record from a primary/secondary row pair.
    fn parse_pair(&self, primary: &[String], secondary: &[String]) -> Option<ListingRecord> {
        let listing_date = parse_listing_date(primary.get(self.date_cell)?)?;
        let company_name = primary.get(self.name_cell)?.trim().to_string();
        let instrument_code = normalize_code(primary.get(self.code_cell)?)?;
        let market_segment = secondary.get(self.segment_cell)?.trim().to_string();
        let offer_price = secondary
            .get(self.price_cell)
            .and_then(|field| parse_offer_price(field));

        Some(ListingRecord {
            listing_date,
            market_segment,
            instrument_code,
            company_name,
            offer_price,
        })
    }
}

impl ListingTableExtractor for JpxListingTable {
    fn extract(&self, html: &str) -> Option<Vec<ListingRecord>> {
        let document = Html::parse_document(html);
        let table = first_table(&document)?;

        let cells: Vec<Vec<String>> = rows(&table)
            .iter()
            .skip(self.header_rows)
            .map(cell_texts)
            .collect();

        let records = cells
            .chunks_exact(2)
            .filter_map(|pair| {
                let record = self.parse_pair(&pair[0], &pair[1]);
                if record.is_none() {
                    debug!(row = ?pair[0], "Skipping unparsable listing row");
                }
                record
            })
            .collect();

        Some(records)
    }
}

// ============================================================================
// Listing Fetcher
// ============================================================================

/// Scrapes the archive pages, most recent first.
pub struct ListingFetcher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn ListingTableExtractor>,
    page_urls: Vec<String>,
}

impl ListingFetcher {
    /// Create a fetcher over the given archive URLs (most recent first).
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Box<dyn ListingTableExtractor>,
        page_urls: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            page_urls,
        }
    }

    /// Fetch listings from the first `max_years` archive pages.
    ///
    /// Pages that fail to load or carry no table are skipped. Codes seen on
    /// a more recent page win over later duplicates. The result may be empty.
    pub async fn fetch_listings(&self, max_years: usize) -> Vec<ListingRecord> {
        let mut listings = Vec::new();
        let mut seen = HashSet::new();

        for url in self.page_urls.iter().take(max_years) {
            let html = match self.fetcher.fetch(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping archive page");
                    continue;
                }
            };

            let Some(records) = self.extractor.extract(&html) else {
                warn!(url = %url, "Archive page has no listing table");
                continue;
            };

            let page_count = records.len();
            listings.extend(
                records
                    .into_iter()
                    .filter(|r| seen.insert(r.instrument_code.clone())),
            );
            debug!(url = %url, records = page_count, "Parsed archive page");
        }

        info!(listings = listings.len(), "Listing fetch complete");
        listings
    }
}

// ============================================================================
// Tests
// ============================================================================
