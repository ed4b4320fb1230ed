//! Transaction completion and signing.
//!
//! The [`Signer`] trait is the narrow contract the assembler finalizes
//! through: balance the transaction toward an explicit change address under
//! an explicit fee policy, then sign it. [`LocalSigner`] is the in-process
//! implementation over the operator's secp256k1 key; tests and alternative
//! custody setups can substitute their own.

use secp256k1::{Message, Secp256k1};

use crate::crypto::keys::{Address, PrivateKey};
use crate::env::FundingOutput;
use crate::script::Script;
use crate::transaction::types::Transaction;
use crate::transaction::validation::TransactionError;

/// Fee policy for completion.
///
/// Premine distribution always runs zero-fee: the distributing network
/// accepts the premine transaction without a miner incentive, and every
/// unit not distributed must come back as change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePolicy {
    /// No fee at all.
    Zero,
    /// A fixed fee in smallest units.
    Fixed(u64),
}

impl FeePolicy {
    fn amount(self) -> u64 {
        match self {
            FeePolicy::Zero => 0,
            FeePolicy::Fixed(fee) => fee,
        }
    }
}

/// The signing collaborator: completes and signs an assembled transaction.
pub trait Signer {
    /// Adds the change output paying `change_address` the unspent residual,
    /// then signs the funding input. Fails with
    /// [`TransactionError::InsufficientFunds`] when the funding value
    /// cannot cover the outputs plus fee.
    fn complete_and_sign(
        &self,
        tx: &mut Transaction,
        funding: &FundingOutput,
        change_address: &Address,
        fee: FeePolicy,
    ) -> Result<(), TransactionError>;
}

// ---------------------------------------------------------------------------
// Signature hash
// ---------------------------------------------------------------------------

/// Computes the legacy SIGHASH_ALL digest for `input_index`: all input
/// scripts cleared, the signed input's script replaced by the previous
/// locking script, hash type appended, double-SHA-256 over the lot.
pub(crate) fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    prev_script: &Script,
) -> [u8; 32] {
    let mut copy = tx.clone();
    for input in &mut copy.inputs {
        input.script_sig = Script::default();
    }
    if let Some(input) = copy.inputs.get_mut(input_index) {
        input.script_sig = prev_script.clone();
    }
    let mut data = copy.serialize();
    data.extend_from_slice(&1u32.to_le_bytes()); // SIGHASH_ALL
    crate::crypto::hash::double_sha256(&data)
}

// ---------------------------------------------------------------------------
// LocalSigner
// ---------------------------------------------------------------------------

/// Signs in-process with the operator's own key.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: PrivateKey,
}

impl LocalSigner {
    /// A signer over the operator's funding key.
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }
}

impl Signer for LocalSigner {
    fn complete_and_sign(
        &self,
        tx: &mut Transaction,
        funding: &FundingOutput,
        change_address: &Address,
        fee: FeePolicy,
    ) -> Result<(), TransactionError> {
        if tx.inputs.is_empty() {
            return Err(TransactionError::InputCount(0));
        }

        // Balance: everything not distributed returns to the operator.
        let required = tx
            .total_output_value()
            .saturating_add(fee.amount());
        if funding.value < required {
            return Err(TransactionError::InsufficientFunds {
                required,
                available: funding.value,
            });
        }
        let residual = funding.value - required;
        if residual > 0 {
            tx.outputs.push(crate::transaction::types::TxOut {
                value: residual,
                script_pubkey: Script::p2pkh(change_address.hash160()),
            });
        }

        // Sign the single funding input.
        let digest = signature_hash(tx, 0, &funding.script_pubkey);
        let secp = Secp256k1::new();
        let message = Message::from_digest(digest);
        let signature = secp.sign_ecdsa(&message, self.key.secret());
        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(0x01); // SIGHASH_ALL marker

        let pubkey = self.key.public_key();
        tx.inputs[0].script_sig = Script::p2pkh_sig(&sig_bytes, &pubkey.serialize());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::transaction::types::{OutPoint, TxIn, TxOut, Txid};

    fn operator() -> PrivateKey {
        PrivateKey::from_bytes(&[0x21; 32], Network::Regtest).unwrap()
    }

    fn funding(value: u64) -> FundingOutput {
        FundingOutput {
            outpoint: OutPoint {
                txid: Txid::from_bytes([0xaa; 32]),
                vout: 0,
            },
            value,
            script_pubkey: Script::p2pkh(operator().address().hash160()),
            confirmations: 6,
            funding_input_count: 1,
        }
    }

    fn unsigned_tx(paid_out: u64) -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TxIn::new(funding(0).outpoint));
        tx.outputs.push(TxOut {
            value: paid_out,
            script_pubkey: Script::p2pkh([0x33; 20]),
        });
        tx
    }

    #[test]
    fn change_output_pays_the_residual() {
        let key = operator();
        let mut tx = unsigned_tx(4_000);
        LocalSigner::new(key.clone())
            .complete_and_sign(&mut tx, &funding(10_000), &key.address(), FeePolicy::Zero)
            .unwrap();

        assert_eq!(tx.outputs.len(), 2);
        let change = &tx.outputs[1];
        assert_eq!(change.value, 6_000);
        assert_eq!(
            change.script_pubkey.p2pkh_destination(),
            Some(key.address().hash160())
        );
    }

    #[test]
    fn exact_balance_adds_no_change() {
        let key = operator();
        let mut tx = unsigned_tx(10_000);
        LocalSigner::new(key.clone())
            .complete_and_sign(&mut tx, &funding(10_000), &key.address(), FeePolicy::Zero)
            .unwrap();
        assert_eq!(tx.outputs.len(), 1);
    }

    #[test]
    fn insufficient_funds_is_reported() {
        let key = operator();
        let mut tx = unsigned_tx(20_000);
        let err = LocalSigner::new(key.clone())
            .complete_and_sign(&mut tx, &funding(10_000), &key.address(), FeePolicy::Zero)
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::InsufficientFunds {
                required: 20_000,
                available: 10_000,
            }
        ));
    }

    #[test]
    fn fixed_fee_reduces_the_change() {
        let key = operator();
        let mut tx = unsigned_tx(4_000);
        LocalSigner::new(key.clone())
            .complete_and_sign(
                &mut tx,
                &funding(10_000),
                &key.address(),
                FeePolicy::Fixed(500),
            )
            .unwrap();
        assert_eq!(tx.outputs[1].value, 5_500);
    }

    #[test]
    fn signature_verifies_against_the_sighash() {
        let key = operator();
        let fund = funding(10_000);
        let mut tx = unsigned_tx(4_000);
        LocalSigner::new(key.clone())
            .complete_and_sign(&mut tx, &fund, &key.address(), FeePolicy::Zero)
            .unwrap();

        // Pull <sig> <pubkey> back out of the scriptSig.
        let chunks = tx.inputs[0].script_sig.chunks();
        let (sig_bytes, pubkey_bytes) = match chunks {
            [crate::script::ScriptChunk::Push(s), crate::script::ScriptChunk::Push(p)] => {
                (s.clone(), p.clone())
            }
            other => panic!("unexpected scriptSig shape: {:?}", other),
        };
        assert_eq!(*sig_bytes.last().unwrap(), 0x01);

        let digest = signature_hash(&tx, 0, &fund.script_pubkey);
        let secp = Secp256k1::new();
        let message = Message::from_digest(digest);
        let signature =
            secp256k1::ecdsa::Signature::from_der(&sig_bytes[..sig_bytes.len() - 1]).unwrap();
        let pubkey = secp256k1::PublicKey::from_slice(&pubkey_bytes).unwrap();
        assert!(secp.verify_ecdsa(&message, &signature, &pubkey).is_ok());
    }

    #[test]
    fn sighash_ignores_existing_script_sigs() {
        let fund = funding(10_000);
        let mut tx = unsigned_tx(4_000);
        let before = signature_hash(&tx, 0, &fund.script_pubkey);
        tx.inputs[0].script_sig = Script::p2pkh_sig(&[0xde, 0xad], &[0xbe, 0xef]);
        let after = signature_hash(&tx, 0, &fund.script_pubkey);
        assert_eq!(before, after);
    }
}
