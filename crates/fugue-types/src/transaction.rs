//! Transaction and parsed-batch input types

use crate::primitives::{AccountId, AccountState, Amount, TxnId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deterministic state-mutation step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Subtract `amount` from the account balance
    Debit {
        /// Account to debit
        account: AccountId,
        /// Amount in minor units
        amount: Amount,
    },
    /// Add `amount` to the account balance
    Credit {
        /// Account to credit
        account: AccountId,
        /// Amount in minor units
        amount: Amount,
    },
    /// Credit whose value originates outside the batch.
    ///
    /// Only conserved when a matching [`OracleReading`] with a valid proof
    /// is attached to the transaction.
    OracleCredit {
        /// Account to credit
        account: AccountId,
        /// Amount in minor units
        amount: Amount,
        /// Oracle source identifier
        source: String,
    },
}

impl Operation {
    /// The account this operation mutates
    pub fn account(&self) -> &AccountId {
        match self {
            Operation::Debit { account, .. }
            | Operation::Credit { account, .. }
            | Operation::OracleCredit { account, .. } => account,
        }
    }
}

/// A postcondition already proven true in isolation by the external
/// single-transaction verifier.
///
/// The pipeline never re-derives these; they only contribute accounts to
/// the read set and their aggregate effect is checked by conservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cond", rename_all = "snake_case")]
pub enum VerifyCondition {
    /// Account balance equals the expected value after the transaction
    BalanceEquals {
        /// Account under the condition
        account: AccountId,
        /// Expected post-transaction balance
        expected: Amount,
    },
    /// Account balance is at least the given floor after the transaction
    BalanceAtLeast {
        /// Account under the condition
        account: AccountId,
        /// Minimum post-transaction balance
        minimum: Amount,
    },
    /// Account balance is non-negative after the transaction
    NonNegative {
        /// Account under the condition
        account: AccountId,
    },
}

impl VerifyCondition {
    /// The account this condition observes
    pub fn account(&self) -> &AccountId {
        match self {
            VerifyCondition::BalanceEquals { account, .. }
            | VerifyCondition::BalanceAtLeast { account, .. }
            | VerifyCondition::NonNegative { account } => account,
        }
    }
}

/// An externally-sourced value consulted by a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReading {
    /// Oracle source identifier
    pub source: String,
    /// Reported value in minor units
    pub value: Amount,
    /// Whether the external proof for this reading verified
    pub proof_valid: bool,
}

/// One unit of work submitted as part of a batch.
///
/// Transactions are created by the caller and are read-only from the
/// pipeline's perspective. The read and write sets are derived once by
/// the dependency analyzer, never stored here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id within the batch
    pub id: TxnId,
    /// Label identifying the operation kind (informational)
    pub intent_name: String,
    /// Pre-transaction state snapshot of every account this transaction touches
    pub accounts: BTreeMap<AccountId, AccountState>,
    /// Deterministic state-mutation steps, applied in order
    pub operations: Vec<Operation>,
    /// Postconditions proven in isolation by the external verifier
    #[serde(default)]
    pub verify_conditions: Vec<VerifyCondition>,
    /// Oracle readings consulted by this transaction
    #[serde(default)]
    pub oracle_readings: Vec<OracleReading>,
}

impl Transaction {
    /// Create a transaction with the given id and intent label
    pub fn new(id: impl Into<TxnId>, intent_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intent_name: intent_name.into(),
            accounts: BTreeMap::new(),
            verify_conditions: Vec::new(),
            operations: Vec::new(),
            oracle_readings: Vec::new(),
        }
    }

    /// Declare an account's pre-transaction state
    pub fn with_account(mut self, account: impl Into<AccountId>, balance: Amount) -> Self {
        self.accounts
            .insert(account.into(), AccountState::with_balance(balance));
        self
    }

    /// Append an operation
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Append a debit followed by a matching credit (a balanced transfer)
    pub fn with_transfer(
        mut self,
        from: impl Into<AccountId>,
        to: impl Into<AccountId>,
        amount: Amount,
    ) -> Self {
        self.operations.push(Operation::Debit {
            account: from.into(),
            amount,
        });
        self.operations.push(Operation::Credit {
            account: to.into(),
            amount,
        });
        self
    }

    /// Attach an oracle reading
    pub fn with_oracle_reading(mut self, source: impl Into<String>, value: Amount, proof_valid: bool) -> Self {
        self.oracle_readings.push(OracleReading {
            source: source.into(),
            value,
            proof_valid,
        });
        self
    }
}

/// Externally parsed atomic-batch representation.
///
/// A named collection of individually-verified intents whose names are
/// unique within the batch. The parser's only obligation to this core is
/// unique names and populated accounts/operations/verify conditions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBatch {
    /// Batch name
    pub name: String,
    /// Verified intents, in submission order
    pub intents: Vec<ParsedIntent>,
}

/// One verified intent inside a [`ParsedBatch`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// Intent name, unique within the batch; becomes the transaction id
    pub name: String,
    /// Pre-transaction account snapshots
    pub accounts: BTreeMap<AccountId, AccountState>,
    /// State-mutation steps
    pub operations: Vec<Operation>,
    /// Verified postconditions
    #[serde(default)]
    pub verify_conditions: Vec<VerifyCondition>,
    /// Oracle readings consulted
    #[serde(default)]
    pub oracle_readings: Vec<OracleReading>,
}

impl ParsedIntent {
    /// Convert the parsed intent into a pipeline [`Transaction`]
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: TxnId::new(self.name.clone()),
            intent_name: self.name,
            accounts: self.accounts,
            operations: self.operations,
            verify_conditions: self.verify_conditions,
            oracle_readings: self.oracle_readings,
        }
    }
}
