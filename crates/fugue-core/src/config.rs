//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_worker_threads() -> usize {
    8
}

fn default_execution_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_prover_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Tunable knobs for batch processing.
///
/// All fields have production defaults; deserializing `{}` yields the
/// same configuration as [`BatchConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Upper bound on concurrent worker threads
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Wall-clock budget for executing one batch
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: Duration,
    /// Wall-clock budget for the linearizability prover
    #[serde(default = "default_prover_timeout")]
    pub prover_timeout: Duration,
}

impl BatchConfig {
    /// Effective worker count: a configured zero is clamped to one so a
    /// misconfigured pool still makes progress
    pub fn effective_workers(&self) -> usize {
        self.worker_threads.max(1)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            execution_timeout: default_execution_timeout(),
            prover_timeout: default_prover_timeout(),
        }
    }
}
