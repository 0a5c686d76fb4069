//! Error types for the scheduler

use fugue_types::TxnId;
use thiserror::Error;

/// Scheduler errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Two transactions in one batch share an id
    #[error("duplicate transaction id in batch: {0}")]
    DuplicateTransaction(TxnId),

    /// A transaction referenced by the strategy is missing from the batch
    #[error("transaction {0} not found in batch")]
    TxnNotFound(TxnId),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
