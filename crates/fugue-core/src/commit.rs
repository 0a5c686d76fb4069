//! Atomic commit and rollback of buffered outputs

use crate::ledger::Ledger;
use crate::snapshot::TxnOutput;
use fugue_metrics::Metrics;
use fugue_types::TxnId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies a validated batch to the ledger, or discards it.
///
/// Commit is all-or-nothing: the ledger swaps to the post-batch state in
/// one step, and rollback simply drops the buffered outputs without ever
/// touching the ledger.
pub struct CommitManager {
    metrics: Arc<Metrics>,
}

impl CommitManager {
    /// Create a manager reporting into the given metrics registry
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Atomically apply buffered outputs to the ledger
    pub fn commit(&self, ledger: &Ledger, outputs: &BTreeMap<TxnId, TxnOutput>) {
        let accounts = ledger.apply_outputs(outputs);
        debug!(
            transactions = outputs.len(),
            accounts, "batch committed"
        );
        self.metrics.increment("batches_committed", 1);
        self.metrics
            .increment("transactions_committed", outputs.len() as u64);
    }

    /// Discard buffered outputs, leaving the ledger untouched
    pub fn rollback(&self, reason: &str, transactions: usize) {
        warn!(reason, transactions, "batch rolled back");
        self.metrics.increment("batches_rolled_back", 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugue_types::{AccountId, AccountState};

    fn output(txn: &str, account: &str, pre: i128, post: i128) -> (TxnId, TxnOutput) {
        (
            TxnId::new(txn),
            TxnOutput {
                txn: TxnId::new(txn),
                pre_states: BTreeMap::from([(
                    AccountId::new(account),
                    AccountState::with_balance(pre),
                )]),
                post_states: BTreeMap::from([(
                    AccountId::new(account),
                    AccountState::with_balance(post),
                )]),
            },
        )
    }

    #[test]
    fn test_commit_applies_and_counts() {
        let metrics = Arc::new(Metrics::new());
        let manager = CommitManager::new(Arc::clone(&metrics));
        let ledger = Ledger::new();

        let outputs = BTreeMap::from([output("tx_a", "alice", 0, 100)]);
        manager.commit(&ledger, &outputs);

        assert_eq!(ledger.balance(&AccountId::new("alice")), Some(100));
        assert_eq!(metrics.counter("batches_committed"), Some(1));
        assert_eq!(metrics.counter("transactions_committed"), Some(1));
    }

    #[test]
    fn test_rollback_leaves_ledger_untouched() {
        let metrics = Arc::new(Metrics::new());
        let manager = CommitManager::new(Arc::clone(&metrics));
        let ledger = Ledger::with_accounts(BTreeMap::from([(
            AccountId::new("alice"),
            AccountState::with_balance(500),
        )]));

        manager.rollback("conservation violated", 3);

        assert_eq!(ledger.balance(&AccountId::new("alice")), Some(500));
        assert_eq!(metrics.counter("batches_rolled_back"), Some(1));
        assert_eq!(metrics.counter("batches_committed"), None);
    }
}
