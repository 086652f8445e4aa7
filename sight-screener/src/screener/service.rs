//! Stale-or-fresh read path over the pipeline and its cache.

use sight_common::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::progress::{ProgressReporter, TracingProgress};

use super::cache::{CacheEntry, CacheStatus};
use super::pipeline::{ScreeningPipeline, ScreeningRun};
use super::report::{CandidateReport, ResultSource};

/// Serves candidates from the cache when valid, otherwise runs the pipeline.
///
/// Pipeline runs are serialized; a caller arriving while a run is in flight
/// waits for it and then reads the fresh cache.
pub struct CandidateService {
    pipeline: ScreeningPipeline,
    progress: Arc<dyn ProgressReporter>,
    run_lock: Mutex<()>,
}

impl CandidateService {
    pub fn new(pipeline: ScreeningPipeline) -> Self {
        Self::with_progress(pipeline, Arc::new(TracingProgress))
    }

    pub fn with_progress(pipeline: ScreeningPipeline, progress: Arc<dyn ProgressReporter>) -> Self {
        Self {
            pipeline,
            progress,
            run_lock: Mutex::new(()),
        }
    }

    /// Screened candidates. `force_refresh` bypasses a valid cache.
    pub async fn candidates(&self, force_refresh: bool) -> CandidateReport {
        if !force_refresh {
            if let Some(entry) = self.pipeline.cache().load_valid() {
                debug!(rows = entry.data.len(), "Serving candidates from cache");
                return cached_report(entry);
            }
        }

        let _guard = self.run_lock.lock().await;

        // A run that finished while we waited has already refreshed the cache.
        if !force_refresh {
            if let Some(entry) = self.pipeline.cache().load_valid() {
                return cached_report(entry);
            }
        }

        fresh_report(self.run_locked().await)
    }

    /// Run the pipeline unconditionally.
    pub async fn refresh(&self) -> ScreeningRun {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    async fn run_locked(&self) -> ScreeningRun {
        info!("Running IPO screening pipeline");
        self.pipeline.run_detailed(self.progress.as_ref()).await
    }

    /// Whether a pipeline run is in progress.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.pipeline.cache().status()
    }

    /// Delete the cache blob. Returns whether a file was removed.
    pub fn clear_cache(&self) -> Result<bool> {
        self.pipeline.cache().clear()
    }
}

fn cached_report(entry: CacheEntry) -> CandidateReport {
    CandidateReport {
        rows: entry.data,
        funnel: Vec::new(),
        timestamp: entry.timestamp,
        source: ResultSource::Cache,
    }
}

/// Report for a run that just completed.
pub fn fresh_report(run: ScreeningRun) -> CandidateReport {
    CandidateReport {
        rows: run.rows,
        funnel: run.funnel,
        timestamp: run.completed_at,
        source: ResultSource::Fresh,
    }
}
