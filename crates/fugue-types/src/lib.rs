//! # fugue-types
//!
//! Shared data model for the fugue batch-transaction pipeline.
//!
//! This crate provides:
//! - [`Transaction`](transaction::Transaction) - One unit of work within a batch
//! - [`Conflict`](conflict::Conflict) - An ordering requirement between two transactions
//! - [`ProofResult`](proof::ProofResult) - Outcome of the linearizability check
//! - [`BatchResult`](result::BatchResult) - The batch's final, immutable record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conflict;
pub mod primitives;
pub mod proof;
pub mod result;
pub mod transaction;

// Re-export commonly used types
pub use conflict::{Conflict, ConflictKind, ResolutionMethod, ResolutionStrategy};
pub use primitives::{AccountId, AccountState, Amount, TxnId};
pub use proof::{ConservationResult, OracleValidation, OrderingViolation, ProofResult};
pub use result::BatchResult;
pub use transaction::{
    Operation, OracleReading, ParsedBatch, ParsedIntent, Transaction, VerifyCondition,
};
