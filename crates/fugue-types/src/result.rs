//! Final batch record

use crate::conflict::Conflict;
use crate::proof::{ConservationResult, ProofResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serde adapter representing a [`Duration`] as float seconds, the form
/// external audit consumers expect
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(
                "duration must be a non-negative, finite number of seconds",
            ));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

/// The batch's final, immutable record.
///
/// This is the only output retained after a pipeline call returns; it is
/// fully serializable for audit and logging consumption and never mutated
/// post-creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Whether the batch committed
    pub success: bool,
    /// Number of transactions executed (0 if execution never started)
    pub transactions_executed: usize,
    /// Number of transactions that were part of a concurrent schedule
    pub transactions_parallel: usize,
    /// Wall-clock time for the whole pipeline run, serialized as float
    /// seconds
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
    /// Parallel speedup relative to estimated serial execution
    pub throughput_improvement: f64,
    /// Worker threads available to the batch
    pub thread_count: usize,
    /// Average parallelism achieved during execution
    pub avg_parallelism: f64,
    /// Linearizability proof; present whenever the proving stage ran
    pub linearizability_proof: Option<ProofResult>,
    /// Conservation proof; present whenever the validation stage ran
    pub conservation_proof: Option<ConservationResult>,
    /// Complete list of conflicts detected, every field populated
    pub conflicts_detected: Vec<Conflict>,
    /// Failure description; empty on success
    pub error_message: String,
}

impl BatchResult {
    /// A failure record for a batch that never reached execution
    pub fn rejected(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            transactions_executed: 0,
            transactions_parallel: 0,
            execution_time: Duration::ZERO,
            throughput_improvement: 1.0,
            thread_count: 0,
            avg_parallelism: 0.0,
            linearizability_proof: None,
            conservation_proof: None,
            conflicts_detected: Vec::new(),
            error_message: error_message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_record() {
        let result = BatchResult::rejected("duplicate transaction id");

        assert!(!result.success);
        assert_eq!(result.transactions_executed, 0);
        assert!(result.linearizability_proof.is_none());
        assert_eq!(result.error_message, "duplicate transaction id");
    }

    #[test]
    fn test_serde_roundtrip() {
        let result = BatchResult {
            success: true,
            transactions_executed: 2,
            transactions_parallel: 2,
            execution_time: Duration::from_millis(12),
            throughput_improvement: 1.8,
            thread_count: 8,
            avg_parallelism: 1.9,
            linearizability_proof: Some(ProofResult::proved(vec![])),
            conservation_proof: Some(ConservationResult::trivially_valid()),
            conflicts_detected: Vec::new(),
            error_message: String::new(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: BatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn test_execution_time_serializes_as_float_seconds() {
        let result = BatchResult {
            execution_time: Duration::from_millis(12),
            ..BatchResult::rejected("")
        };

        let json = serde_json::to_value(&result).unwrap();
        let secs = json["execution_time"].as_f64().unwrap();
        assert!((secs - 0.012).abs() < 1e-9);
    }

    #[test]
    fn test_negative_execution_time_rejected() {
        let json = r#"{
            "success": false,
            "transactions_executed": 0,
            "transactions_parallel": 0,
            "execution_time": -1.0,
            "throughput_improvement": 1.0,
            "thread_count": 0,
            "avg_parallelism": 0.0,
            "linearizability_proof": null,
            "conservation_proof": null,
            "conflicts_detected": [],
            "error_message": ""
        }"#;
        let result: Result<BatchResult, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
