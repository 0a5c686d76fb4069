//! # fugue-metrics
//!
//! Performance and audit metrics for the fugue pipeline.
//!
//! Features:
//! - Histogram for batch latency tracking
//! - Counter for commit/rollback event counting
//! - Gauge for current parallelism values
//! - JSON snapshot export for external monitoring

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collector;
mod histogram;
mod snapshot;

pub use collector::Metrics;
pub use histogram::Histogram;
pub use snapshot::{HistogramSummary, MetricsSnapshot};
