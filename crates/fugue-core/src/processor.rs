//! Batch pipeline orchestration

use crate::commit::CommitManager;
use crate::config::BatchConfig;
use crate::conservation::ConservationValidator;
use crate::error::CoreError;
use crate::executor::ParallelExecutor;
use crate::ledger::Ledger;
use crate::prover::{LinearizabilityProver, ProofOutcome};
use fugue_metrics::Metrics;
use fugue_scheduler::{ConflictDetector, DependencyGraph, RwSet};
use fugue_types::{
    BatchResult, Conflict, ConservationResult, ParsedBatch, ProofResult, Transaction, TxnId,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The single entry point into the pipeline.
///
/// A batch flows through dependency analysis, conflict resolution,
/// concurrent execution, the linearizability proof, conservation
/// validation, and commit. Any stage failure rolls the whole batch back;
/// the ledger is only ever touched by a fully validated batch.
pub struct BatchProcessor {
    config: BatchConfig,
    ledger: Arc<Ledger>,
    metrics: Arc<Metrics>,
    executor: ParallelExecutor,
    prover: LinearizabilityProver,
    commit: CommitManager,
}

impl BatchProcessor {
    /// Create a processor over the given ledger and metrics registry
    pub fn new(config: BatchConfig, ledger: Arc<Ledger>, metrics: Arc<Metrics>) -> Self {
        let executor = ParallelExecutor::new(config.clone());
        let prover = LinearizabilityProver::new(config.prover_timeout);
        let commit = CommitManager::new(Arc::clone(&metrics));
        Self {
            config,
            ledger,
            metrics,
            executor,
            prover,
            commit,
        }
    }

    /// The ledger this processor commits into
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// The metrics registry this processor reports into
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run one batch through the full pipeline.
    ///
    /// Always returns a [`BatchResult`]; rejection reasons are carried in
    /// `error_message` rather than as an error type, since a rejected
    /// batch is a normal, fully-recorded outcome.
    pub fn execute_batch(&self, txns: &[Transaction]) -> BatchResult {
        let started = Instant::now();
        self.metrics.increment("batches_processed", 1);

        if txns.is_empty() {
            return BatchResult {
                success: true,
                transactions_executed: 0,
                transactions_parallel: 0,
                execution_time: started.elapsed(),
                throughput_improvement: 1.0,
                thread_count: 0,
                avg_parallelism: 0.0,
                linearizability_proof: Some(ProofResult::proved(Vec::new())),
                conservation_proof: Some(ConservationResult::trivially_valid()),
                conflicts_detected: Vec::new(),
                error_message: String::new(),
            };
        }

        // stage 1: dependency analysis
        let rw_sets: Vec<(TxnId, RwSet)> = txns
            .iter()
            .map(|t| (t.id.clone(), RwSet::for_transaction(t)))
            .collect();
        let graph = match DependencyGraph::build(&rw_sets) {
            Ok(graph) => graph,
            Err(err) => {
                warn!(error = %err, "batch rejected during dependency analysis");
                return BatchResult::rejected(err.to_string());
            }
        };
        debug!(
            transactions = txns.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        // stage 2: conflict detection and deterministic resolution
        let conflicts = ConflictDetector::detect_conflicts(&graph);
        let strategy = ConflictDetector::resolve_conflicts(&conflicts, &graph);
        debug!(
            conflicts = conflicts.len(),
            groups = strategy.conflict_groups.len(),
            "conflicts resolved"
        );
        self.metrics
            .increment("conflicts_detected", conflicts.len() as u64);

        // stage 3: concurrent execution against isolated snapshots
        let report = match self.executor.execute(txns, &strategy) {
            Ok(report) => report,
            Err(err) => {
                self.commit.rollback(&err.to_string(), txns.len());
                return self.failure(started, 0, conflicts, None, None, err.to_string());
            }
        };
        self.metrics
            .observe_duration("execution_latency", report.wall_time);

        // stage 4: linearizability proof, with serial fallback on timeout
        let (report, proof, serial_fallback) =
            match self.prover.prove(&conflicts, &report.trace) {
                ProofOutcome::Proved(order) => (report, ProofResult::proved(order), false),
                ProofOutcome::Disproved(violation) => {
                    let err = CoreError::LinearizabilityDisproved(violation.clone());
                    self.commit.rollback(&err.to_string(), txns.len());
                    return self.failure(
                        started,
                        txns.len(),
                        conflicts,
                        Some(ProofResult::disproved(violation)),
                        None,
                        err.to_string(),
                    );
                }
                ProofOutcome::TimedOut => {
                    warn!(
                        budget = ?self.config.prover_timeout,
                        "prover timed out; re-executing serially"
                    );
                    self.metrics.increment("prover_timeouts", 1);
                    let mut order: Vec<TxnId> = txns.iter().map(|t| t.id.clone()).collect();
                    order.sort();
                    match self.executor.execute_serial(txns, &order) {
                        Ok(serial_report) => (
                            serial_report,
                            ProofResult::timed_out_with_serial_witness(order),
                            true,
                        ),
                        Err(err) => {
                            self.commit.rollback(&err.to_string(), txns.len());
                            return self.failure(
                                started,
                                0,
                                conflicts,
                                None,
                                None,
                                err.to_string(),
                            );
                        }
                    }
                }
            };

        // stage 5: conservation validation
        let conservation = ConservationValidator::validate(txns, &report.outputs);
        if !conservation.is_valid {
            let err = match conservation.oracle_validations.iter().find(|v| !v.valid) {
                Some(bad) => CoreError::InvalidOracle {
                    oracle_source: bad.source.clone(),
                },
                None => CoreError::ConservationViolation {
                    total_delta: conservation.total_delta,
                },
            };
            self.commit.rollback(&err.to_string(), txns.len());
            return self.failure(
                started,
                txns.len(),
                conflicts,
                Some(proof),
                Some(conservation),
                err.to_string(),
            );
        }

        // stage 6: atomic commit
        self.commit.commit(&self.ledger, &report.outputs);

        let wall = report.wall_time.as_secs_f64();
        let serial = report.serial_estimate.as_secs_f64();
        let throughput_improvement = if wall > 0.0 && serial > 0.0 {
            serial / wall
        } else {
            1.0
        };
        let avg_parallelism =
            throughput_improvement.clamp(1.0, report.workers_used.max(1) as f64);
        let multi_group = strategy.conflict_groups.len() > 1;
        let transactions_parallel = if serial_fallback || !multi_group {
            0
        } else {
            txns.len()
        };

        self.metrics.observe_duration("batch_latency", started.elapsed());
        self.metrics
            .set_gauge("parallelism", transactions_parallel as i64);
        info!(
            transactions = txns.len(),
            groups = strategy.conflict_groups.len(),
            workers = report.workers_used,
            serial_fallback,
            "batch committed"
        );

        BatchResult {
            success: true,
            transactions_executed: txns.len(),
            transactions_parallel,
            execution_time: started.elapsed(),
            throughput_improvement,
            thread_count: report.workers_used,
            avg_parallelism,
            linearizability_proof: Some(proof),
            conservation_proof: Some(conservation),
            conflicts_detected: conflicts,
            error_message: String::new(),
        }
    }

    /// Run one transaction as a batch of one.
    ///
    /// Goes through every pipeline stage; the result reports zero
    /// parallel transactions and a throughput factor of one.
    pub fn execute_single_transaction(&self, tx: &Transaction) -> BatchResult {
        self.execute_batch(std::slice::from_ref(tx))
    }

    /// Run an externally parsed atomic batch.
    ///
    /// Intent names become transaction ids, so they must be unique; a
    /// duplicate rejects the batch before any stage runs.
    pub fn execute_atomic_batch(&self, batch: &ParsedBatch) -> BatchResult {
        let mut names = BTreeSet::new();
        for intent in &batch.intents {
            if !names.insert(intent.name.as_str()) {
                warn!(batch = %batch.name, intent = %intent.name, "duplicate intent name");
                return BatchResult::rejected(format!(
                    "duplicate intent name '{}' in batch '{}'",
                    intent.name, batch.name
                ));
            }
        }

        let txns: Vec<Transaction> = batch
            .intents
            .iter()
            .cloned()
            .map(|intent| intent.into_transaction())
            .collect();
        info!(batch = %batch.name, intents = txns.len(), "processing atomic batch");
        self.execute_batch(&txns)
    }

    fn failure(
        &self,
        started: Instant,
        executed: usize,
        conflicts: Vec<Conflict>,
        proof: Option<ProofResult>,
        conservation: Option<ConservationResult>,
        message: String,
    ) -> BatchResult {
        BatchResult {
            success: false,
            transactions_executed: executed,
            transactions_parallel: 0,
            execution_time: started.elapsed(),
            throughput_improvement: 1.0,
            thread_count: 0,
            avg_parallelism: 0.0,
            linearizability_proof: proof,
            conservation_proof: conservation,
            conflicts_detected: conflicts,
            error_message: message,
        }
    }
}
