//! Progress reporting for screening runs.
//!
//! The pipeline emits a [`PipelineEvent`] between and within stages;
//! frontends (HTTP status, CLI, tests) implement [`ProgressReporter`] to
//! surface them. Closures `Fn(&PipelineEvent)` work as reporters too.

use serde::Serialize;
use tracing::{debug, info, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Listings,
    Prices,
    MarketCaps,
    Ownership,
    Filter,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listings => write!(f, "上場一覧取得"),
            Self::Prices => write!(f, "株価取得"),
            Self::MarketCaps => write!(f, "時価総額取得"),
            Self::Ownership => write!(f, "役員持株判定"),
            Self::Filter => write!(f, "スクリーニング"),
        }
    }
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A stage begins over `total` rows (0 for the listing fetch)
    StageStarted { stage: PipelineStage, total: usize },
    /// One row finished an enrichment stage
    RowEnriched {
        stage: PipelineStage,
        index: usize,
        total: usize,
        code: String,
        found: bool,
    },
    /// A stage finished with `rows` rows in its output
    StageFinished { stage: PipelineStage, rows: usize },
    /// The result was written to the cache
    CacheSaved { rows: usize },
    /// The cache write failed; the result is still returned
    CacheSaveFailed { reason: String },
    /// The run is over
    Finished { candidates: usize },
}

/// Receives pipeline events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &PipelineEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn report(&self, event: &PipelineEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, total } => {
                info!(stage = %stage, total, "Stage started");
            }
            PipelineEvent::RowEnriched {
                stage,
                index,
                total,
                code,
                found,
            } => {
                debug!(stage = %stage, code = %code, found, "Row {}/{}", index + 1, total);
            }
            PipelineEvent::StageFinished { stage, rows } => {
                info!(stage = %stage, rows, "Stage finished");
            }
            PipelineEvent::CacheSaved { rows } => {
                info!(rows, "Screening result cached");
            }
            PipelineEvent::CacheSaveFailed { reason } => {
                warn!(reason = %reason, "Screening result not cached");
            }
            PipelineEvent::Finished { candidates } => {
                info!(candidates, "Screening run finished");
            }
        }
    }
}
