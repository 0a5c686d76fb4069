//! Histogram for latency distributions

use std::sync::atomic::{AtomicU64, Ordering};

/// Bucketed histogram with lock-free observation.
///
/// Bucket boundaries are in milliseconds, sized for batch pipeline
/// latencies (sub-millisecond single transactions up to multi-second
/// serial fallbacks).
pub struct Histogram {
    /// Upper bucket boundaries, in milliseconds
    bounds: Vec<f64>,
    /// Observation count per bucket; the last bucket is unbounded
    counts: Vec<AtomicU64>,
    /// Sum of observed values, in microseconds for integer accumulation
    sum_micros: AtomicU64,
    /// Total observation count
    total: AtomicU64,
}

impl Histogram {
    /// Create a histogram with default batch-latency buckets
    pub fn new() -> Self {
        Self::with_bounds(vec![
            0.5, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1_000.0, 5_000.0, 30_000.0,
        ])
    }

    /// Create a histogram with custom bucket boundaries (milliseconds)
    pub fn with_bounds(bounds: Vec<f64>) -> Self {
        // one extra bucket catches everything past the last boundary
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum_micros: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record one observation, in milliseconds
    pub fn observe(&self, millis: f64) {
        self.sum_micros
            .fetch_add((millis * 1_000.0) as u64, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let bucket = self
            .bounds
            .iter()
            .position(|bound| millis <= *bound)
            .unwrap_or(self.bounds.len());
        self.counts[bucket].fetch_add(1, Ordering::Relaxed);
    }

    /// Mean of all observations, in milliseconds
    pub fn mean(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000.0 / total as f64
    }

    /// Total number of observations
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Per-bucket observation counts, last bucket unbounded
    pub fn bucket_counts(&self) -> Vec<u64> {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
