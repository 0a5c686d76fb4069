//! Concurrent batch execution over a worker pool

use crate::config::BatchConfig;
use crate::error::{CoreError, CoreResult};
use crate::snapshot::{run_transaction, TxnOutput};
use dashmap::DashMap;
use fugue_scheduler::SchedulerError;
use fugue_types::{AccountId, AccountState, ResolutionStrategy, Transaction, TxnId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::thread;
use std::time::{Duration, Instant};

/// One executed transaction's span on a worker thread.
///
/// Timestamps are microseconds since batch start, taken on the executing
/// worker. The prover derives real-time ordering constraints from these
/// spans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    /// Transaction that ran
    pub txn: TxnId,
    /// Conflict group the transaction belongs to
    pub group: usize,
    /// Worker thread index that ran it
    pub worker: usize,
    /// Start of the span, microseconds since batch start
    pub started_us: u64,
    /// End of the span, microseconds since batch start
    pub finished_us: u64,
}

/// Everything the downstream stages need from an execution run
#[derive(Clone, Debug, Default)]
pub struct ExecutionReport {
    /// Buffered outputs, keyed and ordered by transaction id
    pub outputs: BTreeMap<TxnId, TxnOutput>,
    /// Execution trace, ordered by span start
    pub trace: Vec<TraceEvent>,
    /// Wall-clock time for the whole run
    pub wall_time: Duration,
    /// Sum of individual transaction spans, an estimate of serial cost
    pub serial_estimate: Duration,
    /// Worker threads actually spawned
    pub workers_used: usize,
}

/// Runs conflict groups concurrently on a bounded thread pool.
///
/// Groups are units of scheduling: a worker claims a group and runs its
/// members serially in resolved order, threading each member's
/// post-states into the next member's snapshot. Workers never share
/// mutable account state; outputs are buffered per transaction.
pub struct ParallelExecutor {
    config: BatchConfig,
}

impl ParallelExecutor {
    /// Create an executor with the given configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Execute a batch under a resolution strategy.
    ///
    /// Fails with the first error any worker hits; remaining workers
    /// drain and stop at their next group boundary. A wall-clock check
    /// before every transaction enforces the execution budget.
    pub fn execute(
        &self,
        txns: &[Transaction],
        strategy: &ResolutionStrategy,
    ) -> CoreResult<ExecutionReport> {
        if txns.is_empty() {
            return Ok(ExecutionReport::default());
        }

        let index: BTreeMap<&TxnId, &Transaction> = txns.iter().map(|t| (&t.id, t)).collect();
        for group in &strategy.conflict_groups {
            for id in group {
                if !index.contains_key(id) {
                    return Err(SchedulerError::TxnNotFound(id.clone()).into());
                }
            }
        }
        if strategy.transaction_count() != txns.len() {
            return Err(CoreError::ExecutionFailed {
                txn: txns[0].id.clone(),
                reason: "resolution strategy does not cover the whole batch".to_string(),
            });
        }

        let budget = self.config.execution_timeout;
        let origin = Instant::now();
        let deadline = origin + budget;
        let workers = self
            .config
            .effective_workers()
            .min(strategy.conflict_groups.len());

        let queue: Mutex<VecDeque<(usize, &Vec<TxnId>)>> =
            Mutex::new(strategy.conflict_groups.iter().enumerate().collect());
        let outputs: DashMap<TxnId, TxnOutput> = DashMap::new();
        let trace: Mutex<Vec<TraceEvent>> = Mutex::new(Vec::new());
        let failure: Mutex<Option<CoreError>> = Mutex::new(None);

        thread::scope(|scope| {
            for worker in 0..workers {
                let queue = &queue;
                let outputs = &outputs;
                let trace = &trace;
                let failure = &failure;
                let index = &index;
                scope.spawn(move || loop {
                    let job = queue.lock().pop_front();
                    let Some((group_idx, group)) = job else {
                        break;
                    };
                    if failure.lock().is_some() {
                        break;
                    }
                    let mut overlay: BTreeMap<AccountId, AccountState> = BTreeMap::new();
                    for id in group {
                        if Instant::now() >= deadline {
                            let mut slot = failure.lock();
                            if slot.is_none() {
                                *slot = Some(CoreError::ExecutionTimeout { budget });
                            }
                            return;
                        }
                        let tx: &Transaction = index[id];
                        let started_us = origin.elapsed().as_micros() as u64;
                        match run_transaction(tx, &overlay) {
                            Ok(output) => {
                                let finished_us = origin.elapsed().as_micros() as u64;
                                overlay.extend(
                                    output.post_states.iter().map(|(k, v)| (k.clone(), *v)),
                                );
                                outputs.insert(id.clone(), output);
                                trace.lock().push(TraceEvent {
                                    txn: id.clone(),
                                    group: group_idx,
                                    worker,
                                    started_us,
                                    finished_us,
                                });
                            }
                            Err(err) => {
                                let mut slot = failure.lock();
                                if slot.is_none() {
                                    *slot = Some(err);
                                }
                                return;
                            }
                        }
                    }
                });
            }
        });

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        Ok(Self::finish(origin, outputs, trace.into_inner(), workers))
    }

    /// Execute a batch strictly serially in the given order.
    ///
    /// Used as the fallback when the prover cannot decide in time: one
    /// worker, one global order, each transaction seeing every
    /// predecessor's writes. The result is linearizable by construction.
    pub fn execute_serial(
        &self,
        txns: &[Transaction],
        order: &[TxnId],
    ) -> CoreResult<ExecutionReport> {
        if txns.is_empty() {
            return Ok(ExecutionReport::default());
        }

        let index: BTreeMap<&TxnId, &Transaction> = txns.iter().map(|t| (&t.id, t)).collect();
        if order.len() != txns.len() {
            return Err(CoreError::ExecutionFailed {
                txn: txns[0].id.clone(),
                reason: "serial order does not cover the whole batch".to_string(),
            });
        }

        let budget = self.config.execution_timeout;
        let origin = Instant::now();
        let deadline = origin + budget;

        let mut outputs: BTreeMap<TxnId, TxnOutput> = BTreeMap::new();
        let mut trace = Vec::with_capacity(order.len());
        let mut overlay: BTreeMap<AccountId, AccountState> = BTreeMap::new();

        for id in order {
            if Instant::now() >= deadline {
                return Err(CoreError::ExecutionTimeout { budget });
            }
            let tx: &&Transaction = index
                .get(id)
                .ok_or_else(|| CoreError::Scheduler(SchedulerError::TxnNotFound(id.clone())))?;
            let started_us = origin.elapsed().as_micros() as u64;
            let output = run_transaction(tx, &overlay)?;
            let finished_us = origin.elapsed().as_micros() as u64;

            overlay.extend(output.post_states.iter().map(|(k, v)| (k.clone(), *v)));
            outputs.insert(id.clone(), output);
            trace.push(TraceEvent {
                txn: id.clone(),
                group: 0,
                worker: 0,
                started_us,
                finished_us,
            });
        }

        Ok(ExecutionReport {
            outputs,
            trace,
            wall_time: origin.elapsed(),
            serial_estimate: origin.elapsed(),
            workers_used: 1,
        })
    }

    fn finish(
        origin: Instant,
        outputs: DashMap<TxnId, TxnOutput>,
        mut trace: Vec<TraceEvent>,
        workers: usize,
    ) -> ExecutionReport {
        trace.sort_by(|a, b| (a.started_us, &a.txn).cmp(&(b.started_us, &b.txn)));
        let span_micros: u64 = trace.iter().map(|e| e.finished_us - e.started_us).sum();
        ExecutionReport {
            outputs: outputs.into_iter().collect(),
            trace,
            wall_time: origin.elapsed(),
            serial_estimate: Duration::from_micros(span_micros),
            workers_used: workers,
        }
    }
}
