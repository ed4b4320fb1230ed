//! Structural validation of the outgoing transaction and its funding.
//!
//! These are the last checks before broadcast, and they are pure: no
//! network, no retries, no second chances. Any violation fails the run with
//! a named cause, and the half-built transaction is surfaced to the
//! operator rather than discarded — it may represent salvageable work.

use thiserror::Error;

use crate::config::{
    CONFIRMATION_DEPTH, MAX_OUTPUT_COUNT, MIN_OUTPUT_COUNT, REQUIRED_INPUT_COUNT,
    TEST_CONFIRMATION_DEPTH,
};
use crate::crypto::keys::Address;
use crate::env::FundingOutput;
use crate::transaction::types::Transaction;

/// Structural and assembly failures. All fatal to the current run.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The funding transaction has not reached the required depth.
    #[error("funding transaction is not yet confirmed ({depth}/{required} blocks); let's avoid risks and use it when confirmed")]
    NotYetConfirmed {
        /// Current confirmation depth.
        depth: u32,
        /// Depth required in this mode.
        required: u32,
    },

    /// The funding transaction does not look like the single-source premine.
    #[error("funding transaction must have exactly one input with the total funds, found {0}")]
    FundingInputCount(usize),

    /// The outgoing transaction's input count is wrong.
    #[error("outgoing transaction must have exactly one input, found {0}")]
    InputCount(usize),

    /// Too few outputs: change and at least one destination are required.
    #[error("outgoing transaction must have at least {MIN_OUTPUT_COUNT} outputs (change and destination), found {0}")]
    TooFewOutputs(usize),

    /// Too many outputs for one distribution transaction.
    #[error("outgoing transaction can't have more than {MAX_OUTPUT_COUNT} outputs, found {0}")]
    TooManyOutputs(usize),

    /// No output returns funds to the operator's own key.
    #[error("at least one output must return funds to our own key")]
    MissingChangePath,

    /// The funding value cannot cover the requested distribution.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Outputs plus fee, smallest units.
        required: u64,
        /// Funding output value, smallest units.
        available: u64,
    },

    /// A time-constrained record identified its recipient by address only.
    #[error("a time-constrained payment requires the recipient's public key, not just an address")]
    TimeLockWithoutPublicKey,

    /// An assembler phase was entered out of order or twice.
    #[error("assembler used out of phase: expected {expected}, found {found}")]
    PhaseViolation {
        /// Phase the operation requires.
        expected: &'static str,
        /// Phase the assembler was in.
        found: &'static str,
    },
}

/// Funding preconditions, checked before the first input is appended.
///
/// In normal operation the genesis must be buried [`CONFIRMATION_DEPTH`]
/// blocks deep and must itself spend exactly one input, since the expected
/// premine source has exactly one. Test mode (`-t`) relaxes the depth to
/// [`TEST_CONFIRMATION_DEPTH`] and drops the input-count check, so a
/// freshly mined regtest coinbase can fund a dry run.
pub fn validate_funding(funding: &FundingOutput, test_mode: bool) -> Result<(), TransactionError> {
    let required = if test_mode {
        TEST_CONFIRMATION_DEPTH
    } else {
        CONFIRMATION_DEPTH
    };
    if funding.confirmations < required {
        return Err(TransactionError::NotYetConfirmed {
            depth: funding.confirmations,
            required,
        });
    }

    if !test_mode && funding.funding_input_count != REQUIRED_INPUT_COUNT {
        return Err(TransactionError::FundingInputCount(
            funding.funding_input_count,
        ));
    }
    Ok(())
}

/// Structural invariants of the finished transaction:
///
/// - exactly one input;
/// - output count within `[2, 50]`;
/// - at least one pay-to-pubkey-hash output back to `operator` — the
///   guarantee that any unspent remainder stays recoverable.
pub fn validate_outgoing(tx: &Transaction, operator: &Address) -> Result<(), TransactionError> {
    if tx.inputs.len() != REQUIRED_INPUT_COUNT {
        return Err(TransactionError::InputCount(tx.inputs.len()));
    }
    if tx.outputs.len() < MIN_OUTPUT_COUNT {
        return Err(TransactionError::TooFewOutputs(tx.outputs.len()));
    }
    if tx.outputs.len() > MAX_OUTPUT_COUNT {
        return Err(TransactionError::TooManyOutputs(tx.outputs.len()));
    }

    let operator_hash = operator.hash160();
    let has_change_path = tx
        .outputs
        .iter()
        .any(|o| o.script_pubkey.p2pkh_destination() == Some(operator_hash));
    if !has_change_path {
        return Err(TransactionError::MissingChangePath);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::crypto::keys::PrivateKey;
    use crate::script::Script;
    use crate::transaction::types::{OutPoint, TxIn, TxOut, Txid};

    fn operator() -> Address {
        PrivateKey::from_bytes(&[0x42; 32], Network::Regtest)
            .unwrap()
            .address()
    }

    fn funding(confirmations: u32, inputs: usize) -> FundingOutput {
        FundingOutput {
            outpoint: OutPoint {
                txid: Txid::from_bytes([0xaa; 32]),
                vout: 0,
            },
            value: 1_000_000,
            script_pubkey: Script::p2pkh([0x01; 20]),
            confirmations,
            funding_input_count: inputs,
        }
    }

    fn valid_tx(outputs: usize) -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TxIn::new(funding(6, 1).outpoint));
        // Change path first, then destinations.
        tx.outputs.push(TxOut {
            value: 1,
            script_pubkey: Script::p2pkh(operator().hash160()),
        });
        for _ in 1..outputs {
            tx.outputs.push(TxOut {
                value: 1,
                script_pubkey: Script::p2pkh([0x33; 20]),
            });
        }
        tx
    }

    #[test]
    fn well_formed_transaction_passes() {
        assert!(validate_outgoing(&valid_tx(2), &operator()).is_ok());
        assert!(validate_outgoing(&valid_tx(50), &operator()).is_ok());
    }

    #[test]
    fn zero_inputs_rejected() {
        let mut tx = valid_tx(2);
        tx.inputs.clear();
        let err = validate_outgoing(&tx, &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::InputCount(0)));
    }

    #[test]
    fn two_inputs_rejected() {
        let mut tx = valid_tx(2);
        let extra = tx.inputs[0].clone();
        tx.inputs.push(extra);
        let err = validate_outgoing(&tx, &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::InputCount(2)));
    }

    #[test]
    fn single_output_rejected() {
        let err = validate_outgoing(&valid_tx(1), &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::TooFewOutputs(1)));
    }

    #[test]
    fn fifty_one_outputs_rejected() {
        let err = validate_outgoing(&valid_tx(51), &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::TooManyOutputs(51)));
    }

    #[test]
    fn missing_change_path_rejected() {
        let mut tx = valid_tx(3);
        // Replace the change output with a stranger's.
        tx.outputs[0].script_pubkey = Script::p2pkh([0x77; 20]);
        let err = validate_outgoing(&tx, &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::MissingChangePath));
    }

    #[test]
    fn p2sh_outputs_do_not_count_as_change() {
        let mut tx = valid_tx(3);
        tx.outputs[0].script_pubkey = Script::p2sh(operator().hash160());
        let err = validate_outgoing(&tx, &operator()).unwrap_err();
        assert!(matches!(err, TransactionError::MissingChangePath));
    }

    #[test]
    fn shallow_funding_rejected_in_normal_mode() {
        let err = validate_funding(&funding(3, 1), false).unwrap_err();
        assert!(matches!(
            err,
            TransactionError::NotYetConfirmed {
                depth: 3,
                required: 6,
            }
        ));
    }

    #[test]
    fn multi_input_funding_rejected_in_normal_mode() {
        let err = validate_funding(&funding(10, 2), false).unwrap_err();
        assert!(matches!(err, TransactionError::FundingInputCount(2)));
    }

    #[test]
    fn test_mode_relaxes_funding_controls() {
        assert!(validate_funding(&funding(1, 3), true).is_ok());
        let err = validate_funding(&funding(0, 1), true).unwrap_err();
        assert!(matches!(
            err,
            TransactionError::NotYetConfirmed {
                depth: 0,
                required: 1,
            }
        ));
    }

    #[test]
    fn deep_single_input_funding_passes() {
        assert!(validate_funding(&funding(6, 1), false).is_ok());
    }
}
