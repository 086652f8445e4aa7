//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, Local};

use sight_common::config::IpoConfig;
use sight_screener::data::{ProviderError, QuoteProvider, StaticPageFetcher};

pub const ARCHIVE_BASE: &str = "https://archive.test/new/";
pub const ARCHIVE_PAGES: [&str; 5] = [
    "index.html",
    "00-archives-01.html",
    "00-archives-02.html",
    "00-archives-03.html",
    "00-archives-04.html",
];

/// A listing as it appears in the archive fixture.
pub struct Listing {
    pub code: &'static str,
    pub name: &'static str,
    pub years_ago: i32,
    pub price_range: &'static str,
}

/// Render an archive page: two header rows, then two rows per listing.
pub fn archive_page(listings: &[Listing]) -> String {
    let year = Local::now().year();
    let mut html = String::from(
        "<html><body><table>\
         <tr><th>上場日</th><th>会社名</th><th>コード</th></tr>\
         <tr><th>市場区分</th><th>仮条件</th></tr>",
    );
    for l in listings {
        html.push_str(&format!(
            "<tr><td>{}/03/15</td><td>{}</td><td>{}</td></tr>\
             <tr><td>グロース</td><td>{}</td></tr>",
            year - l.years_ago,
            l.name,
            l.code,
            l.price_range
        ));
    }
    html.push_str("</table></body></html>");
    html
}

pub fn market_cap_page(cap: &str) -> String {
    format!(
        "<div id=\"stockinfo_i3\"><table><tr><th>時価総額</th><td>{}</td></tr></table></div>",
        cap
    )
}

pub fn officer_page(role_cell: &str) -> String {
    format!(
        "<table><tr><th>氏名</th><th>役職</th></tr>\
         <tr><td>創業 太郎</td><td>{}</td></tr></table>",
        role_cell
    )
}

pub fn market_cap_url(code: &str) -> String {
    format!("https://cap.test/stock/?code={}", code)
}

pub fn officers_url(code: &str) -> String {
    format!("https://officers.test/holder/{}", code)
}

/// Pipeline configuration pointing at the fixture URLs.
pub fn test_config(cache_path: &Path) -> IpoConfig {
    let mut config = IpoConfig::default();
    config.sources.archive_base_url = ARCHIVE_BASE.to_string();
    config.sources.archive_pages = ARCHIVE_PAGES.iter().map(|p| p.to_string()).collect();
    config.sources.market_cap_url_template = "https://cap.test/stock/?code={code}".to_string();
    config.sources.officers_url_template = "https://officers.test/holder/{code}".to_string();
    config.cache.path = cache_path.to_string_lossy().into_owned();
    config
}

/// Four listings, one of which passes every screen.
pub fn fixture_pages() -> StaticPageFetcher {
    let page = archive_page(&[
        Listing { code: "1111", name: "割安オーナー", years_ago: 3, price_range: "900～1,000" },
        Listing { code: "2222", name: "公開価格超え", years_ago: 2, price_range: "1,000" },
        Listing { code: "3333", name: "大型株", years_ago: 1, price_range: "1,000" },
        Listing { code: "4444", name: "雇われ社長", years_ago: 4, price_range: "1,000" },
    ]);

    StaticPageFetcher::new()
        .with_page(format!("{}{}", ARCHIVE_BASE, ARCHIVE_PAGES[0]), page)
        .with_page(market_cap_url("1111"), market_cap_page("100億円"))
        .with_page(market_cap_url("2222"), market_cap_page("120億5,000万円"))
        .with_page(market_cap_url("3333"), market_cap_page("800億円"))
        .with_page(market_cap_url("4444"), market_cap_page("50億円"))
        .with_page(officers_url("1111"), officer_page("代表取締役社長 (45.0%)"))
        .with_page(officers_url("2222"), officer_page("代表取締役 (60.0%)"))
        .with_page(officers_url("3333"), officer_page("代表取締役 (41.0%)"))
        .with_page(officers_url("4444"), officer_page("代表取締役 (3.5%)"))
}

/// Quote provider backed by a symbol map; unknown symbols fail.
pub struct MockQuotes {
    closes: HashMap<String, f64>,
    calls: AtomicU32,
}

impl MockQuotes {
    pub fn new(closes: &[(&str, f64)]) -> Self {
        Self {
            closes: closes.iter().map(|(s, c)| (s.to_string(), *c)).collect(),
            calls: AtomicU32::new(0),
        }
    }

    /// Closes for the listings in [`fixture_pages`].
    pub fn fixture() -> Self {
        Self::new(&[
            ("1111.T", 799.6),
            ("2222.T", 1200.0),
            ("3333.T", 700.0),
            ("4444.T", 600.0),
        ])
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuoteProvider for MockQuotes {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn latest_close(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.closes
            .get(symbol)
            .copied()
            .map(Some)
            .ok_or_else(|| ProviderError::DataNotAvailable(symbol.to_string()))
    }
}
