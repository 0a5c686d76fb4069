//! Identifier and balance primitives

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed monetary amount in integer minor units.
///
/// All balance arithmetic in the pipeline is exact: values are 128-bit
/// signed integers denominated in the smallest currency unit, and the
/// conservation tolerance is exactly zero. Binary floating point is never
/// used for monetary deltas.
pub type Amount = i128;

/// Unique transaction identifier within a batch.
///
/// Ordering is lexicographic byte-wise comparison of the underlying
/// string. This ordering is what makes conflict resolution reproducible:
/// it never depends on arrival time, thread ids, or hash iteration order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(String);

impl TxnId {
    /// Create a transaction id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TxnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Account identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Account state snapshot with a fixed, explicit schema.
///
/// Unknown fields are rejected at ingestion rather than tolerated
/// mid-pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountState {
    /// Balance in integer minor units
    pub balance: Amount,
}

impl AccountState {
    /// Create an account state with the given balance
    pub fn with_balance(balance: Amount) -> Self {
        Self { balance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_txn_id_lexicographic_order() {
        let a = TxnId::new("tx_a");
        let b = TxnId::new("tx_b");
        let a10 = TxnId::new("tx_10");

        assert!(a < b);
        // Byte-wise comparison, not numeric: "tx_10" < "tx_a"
        assert!(a10 < a);
    }

    #[test]
    fn test_txn_id_display() {
        let id = TxnId::new("transfer_1");
        assert_eq!(id.to_string(), "transfer_1");
        assert_eq!(id.as_str(), "transfer_1");
    }

    #[test]
    fn test_account_id_in_btree_set() {
        let mut set = BTreeSet::new();
        set.insert(AccountId::new("bob"));
        set.insert(AccountId::new("alice"));
        set.insert(AccountId::new("bob"));

        let ids: Vec<&str> = set.iter().map(|a| a.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[test]
    fn test_account_state_serde_roundtrip() {
        let state = AccountState::with_balance(1_500);
        let json = serde_json::to_string(&state).unwrap();
        let back: AccountState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_account_state_rejects_unknown_fields() {
        let json = r#"{"balance": 100, "currency": "USD"}"#;
        let result: Result<AccountState, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_txn_id_serde_transparent() {
        let id = TxnId::new("tx_a");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tx_a\"");
    }
}
