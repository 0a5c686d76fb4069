//! Copy-on-write execution snapshots and per-transaction outputs

use crate::error::{CoreError, CoreResult};
use fugue_scheduler::RwSet;
use fugue_types::{AccountId, AccountState, Amount, Operation, Transaction, TxnId};
use std::collections::BTreeMap;

/// Private working copy of the account states one transaction touches.
///
/// Built from the transaction's declared pre-states, with any post-states
/// already produced by earlier transactions in the same conflict group
/// layered on top. Mutations land here and nowhere else until commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxnSnapshot {
    states: BTreeMap<AccountId, AccountState>,
}

impl TxnSnapshot {
    /// Build the snapshot for a transaction.
    ///
    /// Every account in the read/write set must resolve, either from the
    /// group overlay or from the transaction's own declared pre-state;
    /// the failure names every unresolvable account, not just the first.
    pub fn build(
        tx: &Transaction,
        rw: &RwSet,
        overlay: &BTreeMap<AccountId, AccountState>,
    ) -> CoreResult<Self> {
        let mut states = BTreeMap::new();
        let mut missing: Vec<String> = Vec::new();
        for account in rw.touched() {
            let resolved = overlay
                .get(&account)
                .copied()
                .or_else(|| tx.accounts.get(&account).copied());
            match resolved {
                Some(state) => {
                    states.insert(account, state);
                }
                None => missing.push(account.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(CoreError::ExecutionFailed {
                txn: tx.id.clone(),
                reason: format!("no declared pre-state for {}", missing.join(", ")),
            });
        }
        Ok(Self { states })
    }

    /// Apply one operation to the working copy with exact arithmetic
    pub fn apply(&mut self, txn: &TxnId, op: &Operation) -> CoreResult<()> {
        let account = op.account();
        let state = self
            .states
            .get_mut(account)
            .ok_or_else(|| CoreError::ExecutionFailed {
                txn: txn.clone(),
                reason: format!("operation touches undeclared account {account}"),
            })?;

        let next = match op {
            Operation::Debit { amount, .. } => state.balance.checked_sub(*amount),
            Operation::Credit { amount, .. } | Operation::OracleCredit { amount, .. } => {
                state.balance.checked_add(*amount)
            }
        };
        state.balance = next.ok_or_else(|| CoreError::ExecutionFailed {
            txn: txn.clone(),
            reason: format!("balance overflow on account {account}"),
        })?;
        Ok(())
    }

    /// Current account states, in account order
    pub fn states(&self) -> &BTreeMap<AccountId, AccountState> {
        &self.states
    }

    /// Consume the snapshot, yielding the final states
    pub fn into_states(self) -> BTreeMap<AccountId, AccountState> {
        self.states
    }
}

/// Buffered result of executing one transaction.
///
/// Holds both sides of the state transition so the conservation check can
/// compute the signed delta and the commit stage can apply post-states.
/// Outputs never touch the ledger before commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxnOutput {
    /// The transaction that produced this output
    pub txn: TxnId,
    /// Account states the transaction started from
    pub pre_states: BTreeMap<AccountId, AccountState>,
    /// Account states after all operations applied
    pub post_states: BTreeMap<AccountId, AccountState>,
}

impl TxnOutput {
    /// Signed net balance change of this transaction, in minor units
    pub fn delta(&self) -> Amount {
        let pre: Amount = self.pre_states.values().map(|s| s.balance).sum();
        let post: Amount = self.post_states.values().map(|s| s.balance).sum();
        post - pre
    }
}

/// Execute one transaction against a fresh snapshot.
///
/// The overlay carries post-states from earlier transactions in the same
/// conflict group; pass an empty map for independent transactions.
pub fn run_transaction(
    tx: &Transaction,
    overlay: &BTreeMap<AccountId, AccountState>,
) -> CoreResult<TxnOutput> {
    let rw = RwSet::for_transaction(tx);
    let mut snapshot = TxnSnapshot::build(tx, &rw, overlay)?;
    let pre_states = snapshot.states().clone();

    for op in &tx.operations {
        snapshot.apply(&tx.id, op)?;
    }

    Ok(TxnOutput {
        txn: tx.id.clone(),
        pre_states,
        post_states: snapshot.into_states(),
    })
}
