//! Conflict records and resolution strategy

use crate::primitives::{AccountId, TxnId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three ways two transactions can conflict over a shared account
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictKind {
    /// Read-after-write: the second transaction reads what the first writes
    Raw,
    /// Write-after-write: both transactions write the same account
    Waw,
    /// Write-after-read: the first transaction reads what the second writes
    War,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictKind::Raw => "RAW",
            ConflictKind::Waw => "WAW",
            ConflictKind::War => "WAR",
        };
        f.write_str(s)
    }
}

/// An ordering requirement between exactly two transactions.
///
/// A pair of transactions produces one record per shared account and
/// conflict kind; records are never deduplicated so the audit trail is
/// complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// First transaction of the pair (earlier in submission order)
    pub transaction_1: TxnId,
    /// Second transaction of the pair
    pub transaction_2: TxnId,
    /// Conflict classification
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// The account causing the conflict
    pub resource: AccountId,
    /// Which of the pair must execute first
    pub resolution: TxnId,
}

/// Tag identifying the resolution algorithm used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Byte-wise lexicographic comparison of transaction ids
    Lexicographic,
}

/// Output of conflict resolution for a whole batch.
///
/// The same batch, resolved on different hardware, in different process
/// instances, at different times, produces a bit-identical strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    /// Total order over all transaction ids that are mutually conflicting
    pub execution_order: Vec<TxnId>,
    /// Partitions of transaction ids that must execute serially relative
    /// to each other; a group has size 1 for fully independent transactions
    pub conflict_groups: Vec<Vec<TxnId>>,
    /// Algorithm that produced this strategy
    pub resolution_method: ResolutionMethod,
}

impl ResolutionStrategy {
    /// A strategy for a batch with no transactions
    pub fn empty() -> Self {
        Self {
            execution_order: Vec::new(),
            conflict_groups: Vec::new(),
            resolution_method: ResolutionMethod::Lexicographic,
        }
    }

    /// Total number of transactions covered by the conflict groups
    pub fn transaction_count(&self) -> usize {
        self.conflict_groups.iter().map(|g| g.len()).sum()
    }

    /// The full serial order implied by the strategy: groups in order,
    /// each group's members in resolved order
    pub fn flattened_order(&self) -> Vec<TxnId> {
        self.conflict_groups.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_kind_display() {
        assert_eq!(ConflictKind::Raw.to_string(), "RAW");
        assert_eq!(ConflictKind::Waw.to_string(), "WAW");
        assert_eq!(ConflictKind::War.to_string(), "WAR");
    }

    #[test]
    fn test_conflict_serializes_all_fields() {
        let conflict = Conflict {
            transaction_1: TxnId::new("tx_a"),
            transaction_2: TxnId::new("tx_b"),
            kind: ConflictKind::Waw,
            resource: AccountId::new("treasury"),
            resolution: TxnId::new("tx_a"),
        };

        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["transaction_1"], "tx_a");
        assert_eq!(json["transaction_2"], "tx_b");
        assert_eq!(json["type"], "WAW");
        assert_eq!(json["resource"], "treasury");
        assert_eq!(json["resolution"], "tx_a");
    }

    #[test]
    fn test_flattened_order() {
        let strategy = ResolutionStrategy {
            execution_order: vec![TxnId::new("tx_a"), TxnId::new("tx_b")],
            conflict_groups: vec![
                vec![TxnId::new("tx_a"), TxnId::new("tx_b")],
                vec![TxnId::new("tx_c")],
            ],
            resolution_method: ResolutionMethod::Lexicographic,
        };

        assert_eq!(strategy.transaction_count(), 3);
        assert_eq!(
            strategy.flattened_order(),
            vec![TxnId::new("tx_a"), TxnId::new("tx_b"), TxnId::new("tx_c")]
        );
    }

    #[test]
    fn test_empty_strategy() {
        let strategy = ResolutionStrategy::empty();
        assert_eq!(strategy.transaction_count(), 0);
        assert!(strategy.flattened_order().is_empty());
        assert_eq!(strategy.resolution_method, ResolutionMethod::Lexicographic);
    }
}
