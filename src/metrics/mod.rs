//! Metrics collection and monitoring module
//!
//! Tracks round-trip latency and exchange counts for the console connection.

use metrics::{histogram, increment_counter};
use std::time::Duration;

/// Connection status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    /// Watchdog probe failed
    Lost,
}

/// Snapshot of exchange statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeMetrics {
    pub latency_p50: u64,
    pub latency_p95: u64,
    pub latency_p99: u64,
    pub exchanges: u64,
    pub failures: u64,
}

/// Metrics collector for performance monitoring
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    latency_samples: Vec<u64>,
    exchanges: u64,
    failures: u64,
    max_samples: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new(max_samples: usize) -> Self {
        Self {
            latency_samples: Vec::with_capacity(max_samples),
            exchanges: 0,
            failures: 0,
            max_samples,
        }
    }

    /// Record one round-trip
    pub fn record_exchange(&mut self, elapsed: Duration, ok: bool) {
        let latency = elapsed.as_millis() as u64;

        // Add to samples, maintain max size
        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.remove(0);
        }
        self.latency_samples.push(latency);
        self.exchanges += 1;

        histogram!("rcon_round_trip_ms", latency as f64);
        increment_counter!("rcon_exchanges_total");
        if !ok {
            self.failures += 1;
            increment_counter!("rcon_exchange_failures_total");
        }
    }

    /// Calculate latency percentiles
    pub fn calculate_percentiles(&self) -> (u64, u64, u64) {
        if self.latency_samples.is_empty() {
            return (0, 0, 0);
        }

        let mut sorted = self.latency_samples.clone();
        sorted.sort_unstable();

        let len = sorted.len();
        let p50_idx = (len * 50) / 100;
        let p95_idx = (len * 95) / 100;
        let p99_idx = (len * 99) / 100;

        let p50 = sorted.get(p50_idx).copied().unwrap_or(0);
        let p95 = sorted.get(p95_idx.min(len - 1)).copied().unwrap_or(0);
        let p99 = sorted.get(p99_idx.min(len - 1)).copied().unwrap_or(0);

        (p50, p95, p99)
    }

    pub fn snapshot(&self) -> ExchangeMetrics {
        let (latency_p50, latency_p95, latency_p99) = self.calculate_percentiles();
        ExchangeMetrics {
            latency_p50,
            latency_p95,
            latency_p99,
            exchanges: self.exchanges,
            failures: self.failures,
        }
    }

    /// Reset metrics
    pub fn reset(&mut self) {
        self.latency_samples.clear();
        self.exchanges = 0;
        self.failures = 0;
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector() {
        let mut collector = MetricsCollector::new(100);

        collector.record_exchange(Duration::from_millis(10), true);
        collector.record_exchange(Duration::from_millis(20), false);
        collector.record_exchange(Duration::from_millis(15), true);

        let (p50, p95, p99) = collector.calculate_percentiles();
        assert_eq!(p50, 15);
        assert!(p95 >= p50);
        assert!(p99 >= p95);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.exchanges, 3);
        assert_eq!(snapshot.failures, 1);
    }

    #[test]
    fn test_sample_window_is_bounded() {
        let mut collector = MetricsCollector::new(2);
        for ms in [100, 1, 2] {
            collector.record_exchange(Duration::from_millis(ms), true);
        }
        assert_eq!(collector.calculate_percentiles().2, 2);
        collector.reset();
        assert_eq!(collector.snapshot(), ExchangeMetrics::default());
    }
}
