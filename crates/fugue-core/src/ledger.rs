//! Committed account-state store

use crate::snapshot::TxnOutput;
use fugue_types::{AccountId, AccountState, Amount, TxnId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

/// The committed ledger.
///
/// Readers see either the state before a batch or the state after it,
/// never a partial application: commit builds the next state map off to
/// the side and swaps it in under a single write lock.
pub struct Ledger {
    accounts: RwLock<BTreeMap<AccountId, AccountState>>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a ledger seeded with initial account states
    pub fn with_accounts(accounts: BTreeMap<AccountId, AccountState>) -> Self {
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// Committed balance of an account, if it exists
    pub fn balance(&self, account: &AccountId) -> Option<Amount> {
        self.accounts.read().get(account).map(|s| s.balance)
    }

    /// Full committed state, in account order
    pub fn snapshot(&self) -> BTreeMap<AccountId, AccountState> {
        self.accounts.read().clone()
    }

    /// Number of committed accounts
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Whether the ledger holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Apply buffered outputs atomically.
    ///
    /// Outputs iterate in transaction-id order, which matches the
    /// resolved in-group execution order, so the last writer of each
    /// account is the transaction that executed last. The swap happens
    /// under one write lock; if the built state is found inconsistent the
    /// process aborts rather than expose a partially-applied batch.
    pub(crate) fn apply_outputs(&self, outputs: &BTreeMap<TxnId, TxnOutput>) -> usize {
        let expected: BTreeSet<&AccountId> = outputs
            .values()
            .flat_map(|o| o.post_states.keys())
            .collect();

        let mut guard = self.accounts.write();
        let mut next = guard.clone();
        for output in outputs.values() {
            for (account, state) in &output.post_states {
                next.insert(account.clone(), *state);
            }
        }

        for account in &expected {
            if !next.contains_key(*account) {
                tracing::error!(
                    account = %account,
                    "commit produced a state missing a written account; aborting"
                );
                std::process::abort();
            }
        }

        *guard = next;
        expected.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(txn: &str, account: &str, pre: Amount, post: Amount) -> TxnOutput {
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
        }
    }

    #[test]
    fn test_apply_outputs_updates_balances() {
        let ledger = Ledger::with_accounts(BTreeMap::from([(
            AccountId::new("alice"),
            AccountState::with_balance(500),
        )]));

        let outputs = BTreeMap::from([(TxnId::new("tx_a"), output("tx_a", "alice", 500, 350))]);
        let touched = ledger.apply_outputs(&outputs);

        assert_eq!(touched, 1);
        assert_eq!(ledger.balance(&AccountId::new("alice")), Some(350));
    }

    #[test]
    fn test_last_writer_wins_in_id_order() {
        let ledger = Ledger::new();
        let outputs = BTreeMap::from([
            (TxnId::new("tx_b"), output("tx_b", "pool", 110, 120)),
            (TxnId::new("tx_a"), output("tx_a", "pool", 100, 110)),
        ]);

        ledger.apply_outputs(&outputs);
        // tx_b iterates last, so its post-state is the committed value
        assert_eq!(ledger.balance(&AccountId::new("pool")), Some(120));
    }

    #[test]
    fn test_untouched_accounts_survive() {
        let ledger = Ledger::with_accounts(BTreeMap::from([
            (AccountId::new("alice"), AccountState::with_balance(500)),
            (AccountId::new("carol"), AccountState::with_balance(7)),
        ]));

        let outputs = BTreeMap::from([(TxnId::new("tx_a"), output("tx_a", "alice", 500, 400))]);
        ledger.apply_outputs(&outputs);

        assert_eq!(ledger.balance(&AccountId::new("carol")), Some(7));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_missing_account_reads_none() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance(&AccountId::new("ghost")), None);
        assert!(ledger.is_empty());
    }
}
