//! Global value-conservation checking

use crate::snapshot::TxnOutput;
use fugue_types::{Amount, ConservationResult, OracleValidation, Operation, Transaction, TxnId};
use std::collections::BTreeMap;

/// Checks that a batch creates and destroys no value.
///
/// Internal transfers cancel out; value injected by an oracle credit is
/// excluded from the zero-sum only when a matching reading with a valid
/// proof backs it. The tolerance is exactly zero, which is why all
/// amounts are integers in minor units.
pub struct ConservationValidator;

impl ConservationValidator {
    /// Validate a batch's buffered outputs.
    ///
    /// Never panics and never short-circuits: every oracle reading is
    /// recorded in the result so a rejection names each invalid source.
    pub fn validate(
        txns: &[Transaction],
        outputs: &BTreeMap<TxnId, TxnOutput>,
    ) -> ConservationResult {
        let mut total: Amount = 0;
        let mut overflowed = false;
        let mut validations: Vec<OracleValidation> = Vec::new();
        let mut oracles_valid = true;

        for output in outputs.values() {
            match total.checked_add(output.delta()) {
                Some(sum) => total = sum,
                None => overflowed = true,
            }
        }

        for tx in txns {
            for reading in &tx.oracle_readings {
                validations.push(OracleValidation {
                    source: reading.source.clone(),
                    value: reading.value,
                    valid: reading.proof_valid,
                });
                if !reading.proof_valid {
                    oracles_valid = false;
                }
            }

            for op in &tx.operations {
                let Operation::OracleCredit { amount, source, .. } = op else {
                    continue;
                };
                let backing = tx
                    .oracle_readings
                    .iter()
                    .find(|r| &r.source == source && r.value == *amount);
                match backing {
                    // externally injected value, excluded from the zero-sum
                    Some(reading) if reading.proof_valid => {
                        match total.checked_sub(*amount) {
                            Some(sum) => total = sum,
                            None => overflowed = true,
                        }
                    }
                    Some(_) => oracles_valid = false,
                    None => {
                        oracles_valid = false;
                        validations.push(OracleValidation {
                            source: source.clone(),
                            value: *amount,
                            valid: false,
                        });
                    }
                }
            }
        }

        ConservationResult {
            is_valid: oracles_valid && !overflowed && total == 0,
            total_delta: total,
            oracle_validations: validations,
        }
    }
}
