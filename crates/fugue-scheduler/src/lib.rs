//! # fugue-scheduler
//!
//! Dependency analysis and conflict resolution for the fugue
//! batch-transaction pipeline.
//!
//! This crate provides:
//! - Read/write set derivation per transaction
//! - Dependency graph construction over read/write-set overlap
//! - RAW/WAW/WAR conflict detection with a complete audit trail
//! - Deterministic, lexicographic conflict resolution

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conflict;
pub mod dependency;
pub mod error;
pub mod rw_set;

pub use conflict::ConflictDetector;
pub use dependency::{DependencyEdge, DependencyGraph};
pub use error::{SchedulerError, SchedulerResult};
pub use rw_set::RwSet;
