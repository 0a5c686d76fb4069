//! Pipeline error taxonomy

use fugue_scheduler::SchedulerError;
use fugue_types::{Amount, OrderingViolation, TxnId};
use std::time::Duration;
use thiserror::Error;

/// Errors that reject a batch.
///
/// Every variant is a whole-batch rejection: the pipeline never commits a
/// subset of a failed batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Batch execution exceeded its wall-clock budget
    #[error("batch execution exceeded its {budget:?} wall-clock budget")]
    ExecutionTimeout {
        /// The budget that was exhausted
        budget: Duration,
    },

    /// A transaction could not be executed against its snapshot
    #[error("transaction {txn} failed: {reason}")]
    ExecutionFailed {
        /// Transaction that failed
        txn: TxnId,
        /// What went wrong
        reason: String,
    },

    /// The prover found contradictory ordering requirements
    #[error("linearizability disproved: {0}")]
    LinearizabilityDisproved(OrderingViolation),

    /// Balance deltas across the batch do not sum to zero
    #[error("conservation violated: batch balance delta is {total_delta}, expected 0")]
    ConservationViolation {
        /// The non-zero sum, in minor units
        total_delta: Amount,
    },

    /// An externally-sourced value lacked a valid proof.
    ///
    /// The field is deliberately not named `source`: thiserror would
    /// treat it as the error's cause, and it is an oracle identifier,
    /// not an underlying error.
    #[error("oracle reading from source '{oracle_source}' is not backed by a valid proof")]
    InvalidOracle {
        /// Oracle source identifier
        oracle_source: String,
    },

    /// Dependency analysis rejected the batch
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Convenience result alias for pipeline operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ExecutionFailed {
            txn: TxnId::new("tx_a"),
            reason: "account missing".to_string(),
        };
        assert_eq!(err.to_string(), "transaction tx_a failed: account missing");

        let err = CoreError::ConservationViolation { total_delta: 50 };
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_invalid_oracle_names_the_source_without_a_cause() {
        let err = CoreError::InvalidOracle {
            oracle_source: "price_feed".to_string(),
        };

        assert!(err.to_string().contains("price_feed"));
        // the oracle identifier is data, not an underlying error
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_scheduler_error_converts() {
        let err: CoreError = SchedulerError::DuplicateTransaction(TxnId::new("tx_a")).into();
        assert!(matches!(err, CoreError::Scheduler(_)));
    }
}
