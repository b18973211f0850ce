// Engine Metrics
//
// Tracks customer analysis timings and insight generation outcomes so slow
// analyses and failing insight writes show up without a metrics backend.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Threshold for a slow customer analysis (100ms)
const SLOW_ANALYSIS_THRESHOLD_MS: u64 = 100;

/// Operational counters for the analytics engine
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    analyses: AtomicU64,
    failed_analyses: AtomicU64,
    total_analysis_time_us: AtomicU64,
    slow_analyses: AtomicU64,

    insight_passes: AtomicU64,
    total_insight_pass_time_us: AtomicU64,
    insights_created: AtomicU64,
    insight_write_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Start timing one customer analysis
    pub fn start_analysis(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Analysis, self.clone())
    }

    /// Start timing one insight generation pass
    pub fn start_insight_pass(&self) -> OperationTimer {
        OperationTimer::new(OperationType::InsightPass, self.clone())
    }

    pub fn record_failed_analysis(&self) {
        self.inner.failed_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insights_created(&self, count: u64) {
        self.inner.insights_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_insight_write_failures(&self, count: u64) {
        self.inner
            .insight_write_failures
            .fetch_add(count, Ordering::Relaxed);
    }

    fn record_analysis(&self, duration: Duration) {
        self.inner.analyses.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_analysis_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_ANALYSIS_THRESHOLD_MS {
            self.inner.slow_analyses.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow customer analysis: {}ms", duration.as_millis());
        }
    }

    fn record_insight_pass(&self, duration: Duration) {
        self.inner.insight_passes.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_insight_pass_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Average analysis time in milliseconds
    pub fn avg_analysis_time_ms(&self) -> f64 {
        average_ms(
            self.inner.total_analysis_time_us.load(Ordering::Relaxed),
            self.inner.analyses.load(Ordering::Relaxed),
        )
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            analyses: self.inner.analyses.load(Ordering::Relaxed),
            failed_analyses: self.inner.failed_analyses.load(Ordering::Relaxed),
            avg_analysis_time_ms: self.avg_analysis_time_ms(),
            slow_analyses: self.inner.slow_analyses.load(Ordering::Relaxed),
            insight_passes: self.inner.insight_passes.load(Ordering::Relaxed),
            avg_insight_pass_time_ms: average_ms(
                self.inner.total_insight_pass_time_us.load(Ordering::Relaxed),
                self.inner.insight_passes.load(Ordering::Relaxed),
            ),
            insights_created: self.inner.insights_created.load(Ordering::Relaxed),
            insight_write_failures: self.inner.insight_write_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Analytics Engine Metrics:\n\
             Analyses: {} run, {} failed, avg {:.2}ms, {} slow\n\
             Insights: {} passes, avg {:.2}ms, {} created, {} write failures",
            summary.analyses,
            summary.failed_analyses,
            summary.avg_analysis_time_ms,
            summary.slow_analyses,
            summary.insight_passes,
            summary.avg_insight_pass_time_ms,
            summary.insights_created,
            summary.insight_write_failures,
        );
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average_ms(total_us: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        (total_us as f64 / count as f64) / 1000.0
    }
}

#[derive(Debug, Clone, Copy)]
enum OperationType {
    Analysis,
    InsightPass,
}

/// Records the elapsed time when dropped
pub struct OperationTimer {
    start: Instant,
    operation_type: OperationType,
    metrics: EngineMetrics,
}

impl OperationTimer {
    fn new(operation_type: OperationType, metrics: EngineMetrics) -> Self {
        Self {
            start: Instant::now(),
            operation_type,
            metrics,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        match self.operation_type {
            OperationType::Analysis => self.metrics.record_analysis(duration),
            OperationType::InsightPass => self.metrics.record_insight_pass(duration),
        }
    }
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    #[schema(example = 120)]
    pub analyses: u64,
    #[schema(example = 2)]
    pub failed_analyses: u64,
    #[schema(example = 8.4)]
    pub avg_analysis_time_ms: f64,
    #[schema(example = 1)]
    pub slow_analyses: u64,
    #[schema(example = 6)]
    pub insight_passes: u64,
    #[schema(example = 41.2)]
    pub avg_insight_pass_time_ms: f64,
    #[schema(example = 17)]
    pub insights_created: u64,
    #[schema(example = 0)]
    pub insight_write_failures: u64,
}
