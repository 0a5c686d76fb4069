//! Point-in-time metrics export

use crate::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Mean value in milliseconds
    pub mean_ms: f64,
    /// Total observation count
    pub count: u64,
}

/// Snapshot of every registered metric at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counter values by name
    pub counters: BTreeMap<String, u64>,
    /// Gauge values by name
    pub gauges: BTreeMap<String, i64>,
    /// Histogram summaries by name
    pub histograms: BTreeMap<String, HistogramSummary>,
}

impl MetricsSnapshot {
    /// Capture the current state of a registry
    pub fn capture(metrics: &Metrics) -> Self {
        Self {
            counters: metrics.all_counters().into_iter().collect(),
            gauges: metrics.all_gauges().into_iter().collect(),
            histograms: metrics
                .all_histograms()
                .into_iter()
                .map(|(name, mean_ms, count)| (name, HistogramSummary { mean_ms, count }))
                .collect(),
        }
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_and_export() {
        let metrics = Metrics::new();
        metrics.increment("batches_committed", 3);
        metrics.set_gauge("parallelism", 4);
        metrics.observe("batch_latency", 12.0);

        let snapshot = MetricsSnapshot::capture(&metrics);
        assert_eq!(snapshot.counters["batches_committed"], 3);
        assert_eq!(snapshot.gauges["parallelism"], 4);
        assert_eq!(snapshot.histograms["batch_latency"].count, 1);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("batches_committed"));
        assert!(json.contains("batch_latency"));
    }

    #[test]
    fn test_empty_snapshot() {
        let metrics = Metrics::new();
        let snapshot = MetricsSnapshot::capture(&metrics);
        assert!(snapshot.counters.is_empty());
        assert!(snapshot.gauges.is_empty());
        assert!(snapshot.histograms.is_empty());
    }
}
