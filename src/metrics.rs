//! Performance metrics and statistics tracking for the pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared by the gateway and orchestrator
pub struct PipelineMetrics {
    /// Requests actually sent upstream (cache hits excluded)
    pub upstream_requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    /// Match-detail fetches dropped from an analysis set
    pub detail_fetch_failures: AtomicU64,
    pub analyses_completed: AtomicU64,
    /// Analysis wall-clock times in milliseconds
    analysis_times: RwLock<Vec<u64>>,
    /// Completed analyses by risk level
    analyses_by_risk: RwLock<HashMap<String, u64>>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            upstream_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            detail_fetch_failures: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            analysis_times: RwLock::new(Vec::with_capacity(256)),
            analyses_by_risk: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn record_upstream_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detail_failure(&self) {
        self.detail_fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed analysis
    pub fn record_analysis(&self, duration: Duration, risk_level: &str) {
        self.analyses_completed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.analysis_times.write() {
            times.push(duration.as_millis() as u64);
            // Keep only the most recent window for memory efficiency
            if times.len() > 10_000 {
                times.drain(0..5_000);
            }
        }

        if let Ok(mut by_level) = self.analyses_by_risk.write() {
            *by_level.entry(risk_level.to_string()).or_insert(0) += 1;
        }
    }

    /// Fraction of lookups served from cache
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f64;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f64;
        if hits + misses > 0.0 {
            hits / (hits + misses)
        } else {
            0.0
        }
    }

    /// Upstream requests per second since startup
    pub fn upstream_request_rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.upstream_requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Analysis latency statistics
    pub fn analysis_stats(&self) -> AnalysisStats {
        let times = match self.analysis_times.read() {
            Ok(t) => t,
            Err(_) => return AnalysisStats::default(),
        };
        if times.is_empty() {
            return AnalysisStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        AnalysisStats {
            count: count as u64,
            mean_ms: sum / count as u64,
            p50_ms: sorted[count / 2],
            p95_ms: sorted[(count as f64 * 0.95) as usize],
            p99_ms: sorted[(count as f64 * 0.99) as usize],
            max_ms: *sorted.last().unwrap_or(&0),
        }
    }

    pub fn analyses_by_risk(&self) -> HashMap<String, u64> {
        self.analyses_by_risk
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Log a summary of everything recorded so far
    pub fn print_summary(&self) {
        let requests = self.upstream_requests.load(Ordering::Relaxed);
        let analyses = self.analyses_completed.load(Ordering::Relaxed);
        let failures = self.detail_fetch_failures.load(Ordering::Relaxed);
        let stats = self.analysis_stats();

        info!(
            upstream_requests = requests,
            request_rate = format!("{:.1} req/s", self.upstream_request_rate()),
            cache_hit_rate = format!("{:.1}%", self.cache_hit_rate() * 100.0),
            "Gateway summary"
        );
        info!(
            analyses_completed = analyses,
            detail_fetch_failures = failures,
            mean_ms = stats.mean_ms,
            p50_ms = stats.p50_ms,
            p95_ms = stats.p95_ms,
            p99_ms = stats.p99_ms,
            "Analysis summary"
        );
        for (level, count) in self.analyses_by_risk() {
            info!(risk_level = %level, count, "Analyses by risk level");
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Analysis latency statistics
#[derive(Debug, Default)]
pub struct AnalysisStats {
    pub count: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

/// Periodic reporter that logs a metrics summary on an interval
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
