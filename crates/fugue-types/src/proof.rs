//! Linearizability and conservation proof records

use crate::primitives::{Amount, TxnId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete set of contradictory ordering requirements.
///
/// Produced when the prover disproves linearizability: the listed
/// transactions each require the next to have executed first, closing a
/// cycle that no serial order can satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingViolation {
    /// Transactions forming the contradictory cycle, in cycle order
    pub cycle: Vec<TxnId>,
    /// Human-readable description of the contradiction
    pub detail: String,
}

impl fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.cycle.iter().map(|t| t.as_str()).collect();
        write!(f, "{} [{}]", self.detail, ids.join(" -> "))
    }
}

/// Outcome of the linearizability check.
///
/// `timed_out` distinguishes "proved false" from "could not decide in
/// time": the former is a hard rejection, the latter triggers the serial
/// fallback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResult {
    /// Whether the execution is equivalent to some serial order
    pub is_linearizable: bool,
    /// Witness serial order; present iff `is_linearizable` is true
    pub serial_order: Option<Vec<TxnId>>,
    /// Present iff the prover disproved linearizability
    pub counterexample: Option<OrderingViolation>,
    /// Whether the prover exhausted its time budget
    pub timed_out: bool,
}

impl ProofResult {
    /// Linearizability proved with a witness order
    pub fn proved(serial_order: Vec<TxnId>) -> Self {
        Self {
            is_linearizable: true,
            serial_order: Some(serial_order),
            counterexample: None,
            timed_out: false,
        }
    }

    /// Linearizability disproved with a concrete counterexample
    pub fn disproved(counterexample: OrderingViolation) -> Self {
        Self {
            is_linearizable: false,
            serial_order: None,
            counterexample: Some(counterexample),
            timed_out: false,
        }
    }

    /// The prover timed out and the batch was re-executed serially; the
    /// serial schedule is its own witness
    pub fn timed_out_with_serial_witness(serial_order: Vec<TxnId>) -> Self {
        Self {
            is_linearizable: true,
            serial_order: Some(serial_order),
            counterexample: None,
            timed_out: true,
        }
    }
}

/// Validation record for one externally-sourced value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleValidation {
    /// Oracle source identifier
    pub source: String,
    /// Value consulted, in minor units
    pub value: Amount,
    /// Whether the reading's external proof verified
    pub valid: bool,
}

/// Outcome of the global value-conservation check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationResult {
    /// True iff the signed sum of every balance delta across the batch is
    /// exactly zero and every oracle reading consulted is valid
    pub is_valid: bool,
    /// The computed sum, non-zero on failure, for diagnostics
    pub total_delta: Amount,
    /// Externally-sourced values consulted, each with a validity flag
    pub oracle_validations: Vec<OracleValidation>,
}

impl ConservationResult {
    /// A trivially valid result for an empty batch
    pub fn trivially_valid() -> Self {
        Self {
            is_valid: true,
            total_delta: 0,
            oracle_validations: Vec::new(),
        }
    }
}
