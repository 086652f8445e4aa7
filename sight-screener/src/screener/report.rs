//! Report generation for screening results.
//!
//! Generates reports in two formats:
//! - Markdown (for the terminal and documentation)
//! - JSON (for API/programmatic use)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::CandidateRow;

use super::filter::FilterResult;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// Candidate Report
// ============================================================================

/// Where the reported rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Served from a valid cache blob
    Cache,
    /// Produced by a pipeline run just now
    Fresh,
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "キャッシュ"),
            Self::Fresh => write!(f, "最新取得"),
        }
    }
}

/// Screened candidates plus the context needed to present them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Screened rows
    pub rows: Vec<CandidateRow>,
    /// Filter funnel; empty for cached results
    pub funnel: Vec<FilterResult>,
    /// When the rows were produced
    pub timestamp: DateTime<Utc>,
    /// Cache hit or fresh run
    pub source: ResultSource,
}

impl CandidateReport {
    /// Markdown column headers, in [`CandidateRow`] field order.
    pub const HEADERS: [&'static str; 6] = [
        "コード",
        "銘柄名",
        "上場日",
        "現在値",
        "公開価格",
        "時価総額(億円)",
    ];

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# IPO銘柄スクリーニング結果\n\n");
        md.push_str(&format!(
            "**取得日時**: {} UTC\n**取得元**: {}\n**該当銘柄数**: {}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.source,
            self.rows.len()
        ));

        if !self.funnel.is_empty() {
            md.push_str("## スクリーニング条件別の通過状況\n\n");
            md.push_str("| 条件 | 通過 | 除外 | 除外率 |\n");
            md.push_str("|------|------|------|--------|\n");
            for fr in &self.funnel {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    fr.stage, fr.passed, fr.eliminated, fr.elimination_rate
                ));
            }
            md.push('\n');
        }

        md.push_str("## 候補銘柄\n\n");
        if self.rows.is_empty() {
            md.push_str("条件に該当する銘柄はありません。\n");
            return md;
        }

        md.push_str(&format!("| {} |\n", Self::HEADERS.join(" | ")));
        md.push_str(&format!(
            "|{}\n",
            Self::HEADERS.iter().map(|_| "------|").collect::<String>()
        ));
        for row in &self.rows {
            md.push_str(&format!(
                "| {} | {} | {} | {:.0} | {} | {:.2} |\n",
                row.code,
                row.name,
                row.listing_date.format("%Y-%m-%d"),
                row.current_price,
                row.offer_price,
                row.market_cap,
            ));
        }

        md
    }

    /// Generate JSON report.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
