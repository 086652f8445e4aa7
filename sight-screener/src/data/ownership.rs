//! Ownership classifier.
//!
//! Marks a company as owner-led when any single director holds at least
//! the configured share of the company. Officer pages list each officer
//! as a table row whose second cell reads like "代表取締役社長 (45.2%)".

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use sight_common::config::code_url;
use std::sync::Arc;
use tracing::{debug, info};

use crate::progress::{PipelineEvent, PipelineStage, ProgressReporter};

use super::html::{cell_texts, fold_fullwidth, rows};
use super::provider::PageFetcher;
use super::{EnrichedRecord, Lookup};

/// Role substring identifying a board member.
pub const DIRECTOR_MARKER: &str = "取締役";

static HOLDING_PCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[(（]\s*([0-9.]+)\s*%\s*[)）]").expect("Failed to compile holding regex")
});

/// Parse the parenthesized holding percentage out of a cell.
pub fn parse_holding_pct(text: &str) -> Option<f64> {
    HOLDING_PCT
        .captures(&fold_fullwidth(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A director row with a disclosed holding.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficerHolding {
    /// Role text (second cell)
    pub role: String,
    /// Holding in percent
    pub holding_pct: f64,
}

impl OfficerHolding {
    pub fn is_director(&self) -> bool {
        self.role.contains(DIRECTOR_MARKER)
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Reads director holdings off an officer page.
pub trait OfficerExtractor: Send + Sync {
    /// Director rows in page order. `None` when the page has no table rows.
    fn extract(&self, html: &str) -> Option<Vec<OfficerHolding>>;
}

/// Scans every table row; keeps rows whose second cell carries both the
/// director marker and a parenthesized percentage.
#[derive(Debug, Clone, Default)]
pub struct OfficerTable;

impl OfficerExtractor for OfficerTable {
    fn extract(&self, html: &str) -> Option<Vec<OfficerHolding>> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let all_rows = rows(&root);
        if all_rows.is_empty() {
            return None;
        }

        let holdings = all_rows
            .iter()
            .filter_map(|row| {
                let cells = cell_texts(row);
                let role = cells.get(1)?;
                if !role.contains(DIRECTOR_MARKER) {
                    return None;
                }
                let holding_pct = parse_holding_pct(role)?;
                Some(OfficerHolding {
                    role: role.clone(),
                    holding_pct,
                })
            })
            .collect();

        Some(holdings)
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Decides whether a company is led by an owner-founder.
pub struct OwnershipClassifier {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn OfficerExtractor>,
    url_template: String,
    threshold_pct: f64,
}

impl OwnershipClassifier {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Box<dyn OfficerExtractor>,
        url_template: impl Into<String>,
        threshold_pct: f64,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            url_template: url_template.into(),
            threshold_pct,
        }
    }

    /// Classification with the failure reason preserved.
    ///
    /// `Found(true)` on the first director at or above the threshold,
    /// `Found(false)` when directors are listed but none qualifies,
    /// `Missing` when the page has no officer rows.
    pub async fn classify(&self, code: &str) -> Lookup<bool> {
        let url = code_url(&self.url_template, code);
        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                debug!(code = code, error = %e, "Officer page fetch failed");
                return Lookup::Failed(e.to_string());
            }
        };

        match self.extractor.extract(&html) {
            Some(holdings) => {
                let owner = holdings
                    .iter()
                    .find(|h| h.is_director() && h.holding_pct >= self.threshold_pct);
                if let Some(h) = owner {
                    debug!(code = code, role = %h.role, pct = h.holding_pct, "Owner-led company");
                }
                Lookup::Found(owner.is_some())
            }
            None => Lookup::Missing,
        }
    }

    /// `true` only when a qualifying director was found.
    pub async fn is_owner_founder_ceo(&self, code: &str) -> bool {
        matches!(self.classify(code).await, Lookup::Found(true))
    }

    /// Populate `owner_founder_ceo` on every record, one request per row.
    pub async fn attach_ownership(
        &self,
        mut records: Vec<EnrichedRecord>,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedRecord> {
        let total = records.len();
        progress.report(&PipelineEvent::StageStarted {
            stage: PipelineStage::Ownership,
            total,
        });

        for (index, record) in records.iter_mut().enumerate() {
            let code = record.code().to_string();
            record.owner_founder_ceo = self.classify(&code).await;
            progress.report(&PipelineEvent::RowEnriched {
                stage: PipelineStage::Ownership,
                index,
                total,
                code,
                found: record.owner_founder_ceo.is_found(),
            });
        }

        let owner_led = records.iter().filter(|r| r.is_owner_founder_ceo()).count();
        info!(owner_led, total, "Ownership classification complete");
        progress.report(&PipelineEvent::StageFinished {
            stage: PipelineStage::Ownership,
            rows: total,
        });
        records
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticPageFetcher;

    const OWNER_PAGE: &str = r#"
        <table>
          <tr><th>氏名</th><th>役職</th></tr>
          <tr><td>山田 花子</td><td>監査役 (50.0%)</td></tr>
          <tr><td>佐藤 一郎</td><td>取締役 (3.2%)</td></tr>
          <tr><td>山田 太郎</td><td>代表取締役社長 （45.5％）</td></tr>
        </table>
    "#;

    const DILUTED_PAGE: &str = r#"
        <table>
          <tr><td>鈴木 次郎</td><td>代表取締役 (39.9%)</td></tr>
          <tr><td>田中 三郎</td><td>取締役</td></tr>
        </table>
    "#;

    fn classifier(fetcher: Arc<StaticPageFetcher>) -> OwnershipClassifier {
        OwnershipClassifier::new(
            fetcher,
            Box::new(OfficerTable),
            "https://officers/{code}",
            40.0,
        )
    }

    #[test]
    fn test_parse_holding_pct() {
        assert_eq!(parse_holding_pct("代表取締役 (45.5%)"), Some(45.5));
        assert_eq!(parse_holding_pct("代表取締役（12％）"), Some(12.0));
        assert_eq!(parse_holding_pct("代表取締役 (４５.０%)"), Some(45.0));
        assert_eq!(parse_holding_pct("代表取締役社長（３２．５％）"), Some(32.5));
        assert_eq!(parse_holding_pct("取締役 45.5%"), None);
        assert_eq!(parse_holding_pct("取締役"), None);
    }

    #[test]
    fn test_extract_only_director_rows() {
        let holdings = OfficerTable.extract(OWNER_PAGE).unwrap();
        assert_eq!(holdings.len(), 2);
        assert!(holdings.iter().all(OfficerHolding::is_director));
        assert_eq!(holdings[1].holding_pct, 45.5);
    }

    #[test]
    fn test_extract_without_rows() {
        assert!(OfficerTable.extract("<p>該当なし</p>").is_none());
    }

    #[tokio::test]
    async fn test_classify() {
        let fetcher = Arc::new(
            StaticPageFetcher::new()
                .with_page("https://officers/1111", OWNER_PAGE)
                .with_page("https://officers/2222", DILUTED_PAGE)
                .with_page("https://officers/3333", "<div>empty</div>"),
        );
        let classifier = classifier(fetcher);

        assert_eq!(classifier.classify("1111").await, Lookup::Found(true));
        assert_eq!(classifier.classify("2222").await, Lookup::Found(false));
        assert_eq!(classifier.classify("3333").await, Lookup::Missing);
        assert!(classifier.classify("4444").await.is_failed());

        assert!(classifier.is_owner_founder_ceo("1111").await);
        assert!(!classifier.is_owner_founder_ceo("4444").await);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let page = "<table><tr><td>A</td><td>取締役会長 (40.0%)</td></tr></table>";
        let fetcher = Arc::new(StaticPageFetcher::new().with_page("https://officers/5555", page));
        assert!(classifier(fetcher).is_owner_founder_ceo("5555").await);
    }
}
