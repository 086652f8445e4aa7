//! Configuration management for StockSight services.
//!
//! All services share a single configuration file at `~/.stocksight/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (SIGHT_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SIGHT_LOG_LEVEL` → observability.log_level
//! - `SIGHT_LOG_FORMAT` → observability.log_format
//! - `SIGHT_HOST` → server.host
//! - `SIGHT_PORT` → server.port
//! - `SIGHT_IPO_CACHE_PATH` → ipo.cache.path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Maximum number of listing archive pages the exchange publishes.
pub const MAX_ARCHIVE_PAGES: usize = 5;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".stocksight"),
        |dirs| dirs.home_dir().join(".stocksight"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration shared by all StockSight services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// HTTP server binding
    #[serde(default)]
    pub server: ServerConfig,

    /// IPO screening pipeline configuration
    #[serde(default)]
    pub ipo: IpoConfig,
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// No file at the default path; built-in defaults
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

impl Config {
    /// Load configuration with environment variable overrides applied.
    ///
    /// An explicit `path` must exist. Without one, `~/.stocksight/config.json`
    /// is read when present and the defaults are used otherwise.
    pub fn load_with_env(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let (mut config, source) = match path {
            Some(path) => (Self::load_from(path)?, ConfigSource::File(path.to_path_buf())),
            None => {
                let path = config_path();
                if path.exists() {
                    (Self::load_from(&path)?, ConfigSource::File(path))
                } else {
                    (Self::default(), ConfigSource::Defaults)
                }
            }
        };
        config.apply_env_overrides();
        Ok((config, source))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SIGHT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("SIGHT_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(host) = std::env::var("SIGHT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SIGHT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(path) = std::env::var("SIGHT_IPO_CACHE_PATH") {
            self.ipo.cache.path = path;
        }
    }

    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        let sources = &self.ipo.sources;
        if sources.archive_pages.is_empty() {
            return Err(Error::Config("ipo.sources.archive_pages is empty".into()));
        }
        if sources.archive_pages.len() > MAX_ARCHIVE_PAGES {
            return Err(Error::Config(format!(
                "ipo.sources.archive_pages has {} entries, at most {} allowed",
                sources.archive_pages.len(),
                MAX_ARCHIVE_PAGES
            )));
        }
        if sources.request_timeout_secs == 0 {
            return Err(Error::Config(
                "ipo.sources.request_timeout_secs must be positive".into(),
            ));
        }

        let filters = &self.ipo.filters;
        if filters.min_market_cap > filters.max_market_cap {
            return Err(Error::Config(format!(
                "ipo.filters.min_market_cap ({}) exceeds max_market_cap ({})",
                filters.min_market_cap, filters.max_market_cap
            )));
        }
        if self.ipo.cache.path.trim().is_empty() {
            return Err(Error::Config("ipo.cache.path is empty".into()));
        }

        Ok(())
    }
}

// ============================================================================
// Observability / Server
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// IPO Pipeline
// ============================================================================

/// IPO screening pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpoConfig {
    /// Scraped and queried data sources
    #[serde(default)]
    pub sources: IpoSourcesConfig,

    /// Result cache location
    #[serde(default)]
    pub cache: IpoCacheConfig,

    /// Screening thresholds
    #[serde(default)]
    pub filters: IpoFilterConfig,
}

/// External data sources for the screening pipeline.
///
/// URL templates substitute `{code}` with the bare instrument code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoSourcesConfig {
    /// Base URL of the exchange's new-listing archive
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,

    /// Archive page suffixes, most recent first
    #[serde(default = "default_archive_pages")]
    pub archive_pages: Vec<String>,

    /// Quote provider chart endpoint; the symbol is appended
    #[serde(default = "default_quote_base_url")]
    pub quote_base_url: String,

    /// Capitalization page URL template
    #[serde(default = "default_market_cap_url_template")]
    pub market_cap_url_template: String,

    /// CSS selector for the cells that may carry the capitalization
    #[serde(default = "default_market_cap_selector")]
    pub market_cap_selector: String,

    /// Officer / shareholder page URL template
    #[serde(default = "default_officers_url_template")]
    pub officers_url_template: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for IpoSourcesConfig {
    fn default() -> Self {
        Self {
            archive_base_url: default_archive_base_url(),
            archive_pages: default_archive_pages(),
            quote_base_url: default_quote_base_url(),
            market_cap_url_template: default_market_cap_url_template(),
            market_cap_selector: default_market_cap_selector(),
            officers_url_template: default_officers_url_template(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl IpoSourcesConfig {
    /// Full URLs of the archive pages, most recent first.
    pub fn archive_urls(&self) -> Vec<String> {
        self.archive_pages
            .iter()
            .map(|page| format!("{}{}", self.archive_base_url, page))
            .collect()
    }
}

/// Placeholder substituted with the instrument code in per-code URL templates.
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Fill a per-code URL template such as `market_cap_url_template`.
pub fn code_url(template: &str, code: &str) -> String {
    template.replace(CODE_PLACEHOLDER, code)
}

/// Result cache location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoCacheConfig {
    /// Cache file path, relative paths resolve against the working directory
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for IpoCacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

/// Screening thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoFilterConfig {
    /// Only listings from the last N calendar years are kept
    #[serde(default = "default_max_listing_age_years")]
    pub max_listing_age_years: i32,

    /// Lower market cap bound, in hundred-million yen (inclusive)
    #[serde(default = "default_min_market_cap")]
    pub min_market_cap: f64,

    /// Upper market cap bound, in hundred-million yen (inclusive)
    #[serde(default = "default_max_market_cap")]
    pub max_market_cap: f64,

    /// Director holding (%) at or above which a company counts as owner-led
    #[serde(default = "default_min_director_holding_pct")]
    pub min_director_holding_pct: f64,

    /// Number of archive years (pages) to scrape
    #[serde(default = "default_max_archive_years")]
    pub max_archive_years: usize,
}

impl Default for IpoFilterConfig {
    fn default() -> Self {
        Self {
            max_listing_age_years: default_max_listing_age_years(),
            min_market_cap: default_min_market_cap(),
            max_market_cap: default_max_market_cap(),
            min_director_holding_pct: default_min_director_holding_pct(),
            max_archive_years: default_max_archive_years(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    4480
}
fn default_archive_base_url() -> String {
    "https://www.jpx.co.jp/listing/stocks/new/".into()
}
fn default_archive_pages() -> Vec<String> {
    vec![
        "index.html".into(),
        "00-archives-01.html".into(),
        "00-archives-02.html".into(),
        "00-archives-03.html".into(),
        "00-archives-04.html".into(),
    ]
}
fn default_quote_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart/".into()
}
fn default_market_cap_url_template() -> String {
    "https://kabutan.jp/stock/?code={code}".into()
}
fn default_market_cap_selector() -> String {
    "#stockinfo_i3 td".into()
}
fn default_officers_url_template() -> String {
    "https://kabutan.jp/stock/holder?code={code}".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)"
        .into()
}
fn default_cache_path() -> String {
    "ipo_cache.json".into()
}
fn default_max_listing_age_years() -> i32 {
    10
}
fn default_min_market_cap() -> f64 {
    30.0
}
fn default_max_market_cap() -> f64 {
    700.0
}
fn default_min_director_holding_pct() -> f64 {
    40.0
}
fn default_max_archive_years() -> usize {
    MAX_ARCHIVE_PAGES
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.server.port, 4480);
        assert_eq!(config.ipo.sources.archive_pages.len(), MAX_ARCHIVE_PAGES);
        assert_eq!(config.ipo.sources.request_timeout_secs, 10);
        assert_eq!(config.ipo.cache.path, "ipo_cache.json");
        assert_eq!(config.ipo.filters.max_listing_age_years, 10);
        assert!((config.ipo.filters.min_market_cap - 30.0).abs() < f64::EPSILON);
        assert!((config.ipo.filters.max_market_cap - 700.0).abs() < f64::EPSILON);
        assert!((config.ipo.filters.min_director_holding_pct - 40.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json = r#"{
            "observability": { "level": "debug" },
            "ipo": { "filters": { "max_market_cap": 500.0 } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
        assert!((config.ipo.filters.max_market_cap - 500.0).abs() < f64::EPSILON);
        assert!((config.ipo.filters.min_market_cap - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.ipo.sources.archive_pages.len(), 5);
    }

    #[test]
    fn test_source_urls() {
        let sources = IpoSourcesConfig::default();
        let urls = sources.archive_urls();
        assert_eq!(urls[0], "https://www.jpx.co.jp/listing/stocks/new/index.html");
        assert!(urls[4].ends_with("00-archives-04.html"));
        assert_eq!(
            code_url(&sources.market_cap_url_template, "7203"),
            "https://kabutan.jp/stock/?code=7203"
        );
        assert!(code_url(&sources.officers_url_template, "130A").ends_with("code=130A"));
        assert_eq!(code_url("https://static.test/page", "7203"), "https://static.test/page");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.ipo.sources.archive_pages.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ipo.sources.archive_pages.push("extra.html".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ipo.filters.min_market_cap = 800.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ipo.sources.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "server": { "port": 9000 } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_with_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "ipo": { "cache": { "path": "from_file.json" } } }"#).unwrap();

        std::env::set_var("SIGHT_IPO_CACHE_PATH", "/tmp/from_env.json");
        let loaded = Config::load_with_env(Some(&path));
        std::env::remove_var("SIGHT_IPO_CACHE_PATH");

        let (config, source) = loaded.unwrap();
        assert_eq!(config.ipo.cache.path, "/tmp/from_env.json");
        assert_eq!(source, ConfigSource::File(path.clone()));
        assert_eq!(source.to_string(), path.display().to_string());
        assert_eq!(Config::load_from(&path).unwrap().ipo.cache.path, "from_file.json");
    }

    #[test]
    fn test_load_with_env_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_with_env(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
        assert_eq!(ConfigSource::Defaults.to_string(), "defaults");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
