//! IPO Candidate Screener Module.
//!
//! Turns enriched listings into a short list of candidates and keeps the
//! latest result on disk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      IPOスクリーニング構成                           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐           │
//! │  │  上場一覧   │────▶│  株価/時価  │────▶│  役員持株   │           │
//! │  │  Listings   │     │  Enrichers  │     │  Ownership  │           │
//! │  └─────────────┘     └─────────────┘     └──────┬──────┘           │
//! │                                                 │                   │
//! │  ┌─────────────┐     ┌─────────────┐            │                   │
//! │  │ CacheStore  │◀────│   Filter    │◀───────────┘                   │
//! │  │   (JSON)    │     │ (7 stages)  │                                │
//! │  └─────────────┘     └─────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use sight_screener::screener::{CandidateService, ScreeningPipeline};
//!
//! let pipeline = ScreeningPipeline::from_config(&config.ipo)?;
//! let service = CandidateService::new(pipeline);
//!
//! // Cached when valid, otherwise a fresh run
//! let report = service.candidates(false).await;
//! ```

pub mod cache;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod service;

pub use cache::{is_valid, is_valid_at, CacheEntry, CacheStatus, CacheStore, CACHE_EXPIRY_DAYS};
pub use filter::{FilterResult, FilterStage, ScreeningFilter};
pub use pipeline::{ScreeningPipeline, ScreeningRun};
pub use report::{CandidateReport, ReportFormat, ResultSource};
pub use service::{fresh_report, CandidateService};
