//! Thread-safe metrics registry

use crate::Histogram;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Thread-safe registry of counters, gauges, and histograms.
///
/// Names are ordered so exported snapshots list metrics in a stable
/// order.
pub struct Metrics {
    histograms: RwLock<BTreeMap<String, Arc<Histogram>>>,
    counters: RwLock<BTreeMap<String, Arc<AtomicU64>>>,
    gauges: RwLock<BTreeMap<String, Arc<AtomicI64>>>,
}

impl Metrics {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            histograms: RwLock::new(BTreeMap::new()),
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    /// Record a histogram observation in milliseconds
    pub fn observe(&self, name: &str, millis: f64) {
        if let Some(h) = self.histograms.read().get(name) {
            h.observe(millis);
            return;
        }
        self.histograms
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::new()))
            .observe(millis);
    }

    /// Record a duration observation
    pub fn observe_duration(&self, name: &str, duration: Duration) {
        self.observe(name, duration.as_secs_f64() * 1_000.0);
    }

    /// Increment a counter
    pub fn increment(&self, name: &str, delta: u64) {
        if let Some(c) = self.counters.read().get(name) {
            c.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        self.counters
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Set a gauge value
    pub fn set_gauge(&self, name: &str, value: i64) {
        if let Some(g) = self.gauges.read().get(name) {
            g.store(value, Ordering::Relaxed);
            return;
        }
        self.gauges
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicI64::new(0)))
            .store(value, Ordering::Relaxed);
    }

    /// Current counter value, if the counter exists
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters
            .read()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Current gauge value, if the gauge exists
    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges
            .read()
            .get(name)
            .map(|g| g.load(Ordering::Relaxed))
    }

    /// Histogram mean in milliseconds, if the histogram exists
    pub fn histogram_mean(&self, name: &str) -> Option<f64> {
        self.histograms.read().get(name).map(|h| h.mean())
    }

    /// All counters, in name order
    pub fn all_counters(&self) -> Vec<(String, u64)> {
        self.counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// All gauges, in name order
    pub fn all_gauges(&self) -> Vec<(String, i64)> {
        self.gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// All histograms as (name, mean, count), in name order
    pub fn all_histograms(&self) -> Vec<(String, f64, u64)> {
        self.histograms
            .read()
            .iter()
            .map(|(k, h)| (k.clone(), h.mean(), h.count()))
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counter_increments() {
        let metrics = Metrics::new();
        metrics.increment("batches_committed", 1);
        metrics.increment("batches_committed", 2);

        assert_eq!(metrics.counter("batches_committed"), Some(3));
        assert_eq!(metrics.counter("missing"), None);
    }

    #[test]
    fn test_gauge_stores_latest() {
        let metrics = Metrics::new();
        metrics.set_gauge("parallelism", 4);
        metrics.set_gauge("parallelism", 2);

        assert_eq!(metrics.gauge("parallelism"), Some(2));
    }

    #[test]
    fn test_histogram_observation() {
        let metrics = Metrics::new();
        metrics.observe("batch_latency", 10.0);
        metrics.observe("batch_latency", 30.0);

        let mean = metrics.histogram_mean("batch_latency").unwrap();
        assert!((mean - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_observe_duration() {
        let metrics = Metrics::new();
        metrics.observe_duration("batch_latency", Duration::from_millis(5));

        let mean = metrics.histogram_mean("batch_latency").unwrap();
        assert!((mean - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_all_metrics_in_name_order() {
        let metrics = Metrics::new();
        metrics.increment("z_counter", 1);
        metrics.increment("a_counter", 1);

        let names: Vec<String> = metrics.all_counters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a_counter", "z_counter"]);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(Metrics::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics.increment("events", 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.counter("events"), Some(800));
    }
}
