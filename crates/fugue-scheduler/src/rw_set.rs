//! Read/write set derivation for transactions

use fugue_types::{AccountId, Transaction};
use std::collections::BTreeSet;

/// Read/write set for a transaction.
///
/// Tracks which accounts a transaction observes and which it mutates.
/// Backed by ordered sets: iteration order feeds conflict detection, and
/// resolution must be bit-identical across processes, so hash-based
/// iteration order is not acceptable here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RwSet {
    /// Accounts that are read
    pub reads: BTreeSet<AccountId>,
    /// Accounts that are written
    pub writes: BTreeSet<AccountId>,
}

impl RwSet {
    /// Create a new empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the read and write sets for a transaction.
    ///
    /// The write set is exactly the accounts mutated by its operations;
    /// the read set covers every account referenced by an operation or a
    /// verify condition. The write set is therefore always a subset of
    /// the accounts appearing in the operations.
    pub fn for_transaction(tx: &Transaction) -> Self {
        let mut set = Self::new();
        for op in &tx.operations {
            set.record_read(op.account().clone());
            set.record_write(op.account().clone());
        }
        for cond in &tx.verify_conditions {
            set.record_read(cond.account().clone());
        }
        set
    }

    /// Record a read access
    pub fn record_read(&mut self, account: AccountId) {
        self.reads.insert(account);
    }

    /// Record a write access
    pub fn record_write(&mut self, account: AccountId) {
        self.writes.insert(account);
    }

    /// Check if this transaction reads an account
    pub fn reads_account(&self, account: &AccountId) -> bool {
        self.reads.contains(account)
    }

    /// Check if this transaction writes an account
    pub fn writes_account(&self, account: &AccountId) -> bool {
        self.writes.contains(account)
    }

    /// Accounts this set reads that `earlier` writes (read-after-write),
    /// in lexicographic order
    pub fn raw_overlap(&self, earlier: &RwSet) -> Vec<AccountId> {
        self.reads.intersection(&earlier.writes).cloned().collect()
    }

    /// Accounts both sets write (write-after-write), in lexicographic order
    pub fn waw_overlap(&self, other: &RwSet) -> Vec<AccountId> {
        self.writes.intersection(&other.writes).cloned().collect()
    }

    /// Accounts this set writes that `earlier` reads (write-after-read),
    /// in lexicographic order
    pub fn war_overlap(&self, earlier: &RwSet) -> Vec<AccountId> {
        self.writes.intersection(&earlier.reads).cloned().collect()
    }

    /// Union of reads and writes, in lexicographic order
    pub fn touched(&self) -> BTreeSet<AccountId> {
        self.reads.union(&self.writes).cloned().collect()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugue_types::{Transaction, VerifyCondition};

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    #[test]
    fn test_derivation_from_transfer() {
        let tx = Transaction::new("tx_1", "transfer")
            .with_account("alice", 500)
            .with_account("bob", 100)
            .with_transfer("alice", "bob", 150);

        let rw = RwSet::for_transaction(&tx);

        assert!(rw.writes_account(&acct("alice")));
        assert!(rw.writes_account(&acct("bob")));
        assert!(rw.reads_account(&acct("alice")));
        assert!(rw.reads_account(&acct("bob")));
    }

    #[test]
    fn test_verify_conditions_extend_read_set_only() {
        let mut tx = Transaction::new("tx_1", "transfer")
            .with_account("alice", 500)
            .with_account("bob", 100)
            .with_transfer("alice", "bob", 150);
        tx.verify_conditions.push(VerifyCondition::NonNegative {
            account: acct("escrow"),
        });

        let rw = RwSet::for_transaction(&tx);

        assert!(rw.reads_account(&acct("escrow")));
        assert!(!rw.writes_account(&acct("escrow")));
    }

    #[test]
    fn test_write_set_subset_of_operation_accounts() {
        let tx = Transaction::new("tx_1", "transfer")
            .with_account("alice", 500)
            .with_account("bob", 100)
            .with_account("observer", 0)
            .with_transfer("alice", "bob", 150);

        let rw = RwSet::for_transaction(&tx);
        let op_accounts: BTreeSet<AccountId> =
            tx.operations.iter().map(|op| op.account().clone()).collect();

        assert!(rw.writes.is_subset(&op_accounts));
    }

    #[test]
    fn test_raw_overlap() {
        let mut earlier = RwSet::new();
        earlier.record_write(acct("treasury"));

        let mut later = RwSet::new();
        later.record_read(acct("treasury"));

        assert_eq!(later.raw_overlap(&earlier), vec![acct("treasury")]);
        assert!(earlier.raw_overlap(&later).is_empty());
    }

    #[test]
    fn test_waw_overlap_is_symmetric() {
        let mut a = RwSet::new();
        a.record_write(acct("treasury"));
        let mut b = RwSet::new();
        b.record_write(acct("treasury"));

        assert_eq!(a.waw_overlap(&b), b.waw_overlap(&a));
        assert_eq!(a.waw_overlap(&b), vec![acct("treasury")]);
    }

    #[test]
    fn test_war_overlap() {
        let mut earlier = RwSet::new();
        earlier.record_read(acct("rate"));

        let mut later = RwSet::new();
        later.record_write(acct("rate"));

        assert_eq!(later.war_overlap(&earlier), vec![acct("rate")]);
    }

    #[test]
    fn test_overlap_order_is_lexicographic() {
        let mut a = RwSet::new();
        a.record_write(acct("zeta"));
        a.record_write(acct("alpha"));
        a.record_write(acct("mid"));

        let mut b = RwSet::new();
        b.record_write(acct("zeta"));
        b.record_write(acct("alpha"));
        b.record_write(acct("mid"));

        assert_eq!(
            a.waw_overlap(&b),
            vec![acct("alpha"), acct("mid"), acct("zeta")]
        );
    }

    #[test]
    fn test_no_overlap() {
        let mut a = RwSet::new();
        a.record_write(acct("alice"));
        let mut b = RwSet::new();
        b.record_write(acct("bob"));

        assert!(a.waw_overlap(&b).is_empty());
        assert!(a.raw_overlap(&b).is_empty());
        assert!(a.war_overlap(&b).is_empty());
    }

    #[test]
    fn test_touched_union() {
        let mut rw = RwSet::new();
        rw.record_read(acct("alice"));
        rw.record_write(acct("bob"));

        let touched = rw.touched();
        assert_eq!(touched.len(), 2);
        assert!(touched.contains(&acct("alice")));
        assert!(touched.contains(&acct("bob")));
    }
}
