//! # fugue-core
//!
//! The parallel batch-transaction pipeline.
//!
//! A batch of transactions flows through six stages: dependency
//! analysis, conflict detection and resolution, concurrent execution
//! against isolated snapshots, a linearizability proof, a global
//! conservation check, and an atomic commit or rollback. Control returns
//! to the caller only from [`BatchProcessor`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commit;
pub mod config;
pub mod conservation;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod processor;
pub mod prover;
pub mod snapshot;

pub use commit::CommitManager;
pub use config::BatchConfig;
pub use conservation::ConservationValidator;
pub use error::{CoreError, CoreResult};
pub use executor::{ExecutionReport, ParallelExecutor, TraceEvent};
pub use ledger::Ledger;
pub use processor::BatchProcessor;
pub use prover::{LinearizabilityProver, ProofOutcome};
pub use snapshot::{TxnOutput, TxnSnapshot};
