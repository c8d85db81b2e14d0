//! Serving metrics for the prediction endpoint.

use crate::types::prediction::RiskClass;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for served predictions
pub struct PredictionMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Failed predictions
    pub predictions_failed: AtomicU64,
    /// Successful predictions per class
    by_class: RwLock<HashMap<RiskClass, u64>>,
    /// Failures per error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            by_class: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, processing_time: Duration, probability: f64, class: RiskClass) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut by_class) = self.by_class.write() {
            *by_class.entry(class).or_insert(0) += 1;
        }
    }

    /// Record a failed prediction
    pub fn record_failure(&self, processing_time: Duration, kind: &str) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.predictions_served.load(Ordering::Relaxed)
            + self.predictions_failed.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    pub fn get_class_counts(&self) -> HashMap<RiskClass, u64> {
        self.by_class.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind.read().map(|m| m.clone()).unwrap_or_default()
    }

    /// Point-in-time view served by `GET /metrics`
    pub fn snapshot(&self) -> MetricsSnapshot {
        let class_counts = self.get_class_counts();
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            low_risk: class_counts.get(&RiskClass::Low).copied().unwrap_or(0),
            high_risk: class_counts.get(&RiskClass::High).copied().unwrap_or(0),
            failures_by_kind: self.get_failures_by_kind(),
            probability_distribution: self.get_probability_distribution(),
            processing: self.get_processing_stats(),
            throughput_per_sec: self.get_throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let total = snapshot.predictions_served + snapshot.predictions_failed;
        let high_rate = if snapshot.predictions_served > 0 {
            (snapshot.high_risk as f64 / snapshot.predictions_served as f64) * 100.0
        } else {
            0.0
        };

        info!(
            requests = total,
            served = snapshot.predictions_served,
            failed = snapshot.predictions_failed,
            high_risk_pct = format!("{:.1}", high_rate),
            throughput = format!("{:.2} req/s", snapshot.throughput_per_sec),
            "Prediction metrics summary"
        );
        info!(
            mean_us = snapshot.processing.mean_us,
            p50_us = snapshot.processing.p50_us,
            p95_us = snapshot.processing.p95_us,
            p99_us = snapshot.processing.p99_us,
            max_us = snapshot.processing.max_us,
            "Processing time"
        );
        for (kind, count) in &snapshot.failures_by_kind {
            info!(kind = %kind, count, "Failures by kind");
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub predictions_failed: u64,
    pub low_risk: u64,
    pub high_risk: u64,
    pub failures_by_kind: HashMap<String, u64>,
    /// Counts per probability decile
    pub probability_distribution: [u64; 10],
    pub processing: ProcessingStats,
    pub throughput_per_sec: f64,
    pub uptime_secs: u64,
}

/// Logs a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
