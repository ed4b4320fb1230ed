//! Incremental construction of the distribution transaction.
//!
//! The assembler is a small state machine. It starts in the collecting
//! phase with the single funding input already attached, accepts records
//! one at a time, and finalizes exactly once: sign, balance change, then
//! run the structural checks. After finalization it only hands out the
//! finished transaction.
//!
//! A second, inputless mode exists for `-g`: it synthesizes the time-lock
//! scripts for a distribution file without touching any funds, so the
//! redeem scripts can be archived before the real run.

use tracing::{debug, info};

use crate::config::Network;
use crate::context::RunContext;
use crate::crypto::keys::Address;
use crate::env::FundingOutput;
use crate::record::DistributionRecord;
use crate::script::{RedeemScript, Script};
use crate::transaction::signing::{FeePolicy, Signer};
use crate::transaction::types::{Transaction, TxIn, TxOut};
use crate::transaction::validation::{self, TransactionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Finalized,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Collecting => "collecting",
            Phase::Finalized => "finalized",
        }
    }
}

/// Builds the outgoing transaction, one record at a time.
pub struct TransactionAssembler {
    tx: Transaction,
    funding: Option<FundingOutput>,
    network: Network,
    phase: Phase,
}

impl TransactionAssembler {
    /// Starts a new assembly spending `funding`. The funding output is
    /// vetted first (depth, single-input source) and becomes the sole
    /// input of the transaction being built.
    pub fn new(funding: FundingOutput, ctx: &RunContext) -> Result<Self, TransactionError> {
        validation::validate_funding(&funding, ctx.test_mode())?;

        let mut tx = Transaction::new();
        tx.inputs.push(TxIn::new(funding.outpoint));
        debug!(
            outpoint = %funding.outpoint.txid,
            vout = funding.outpoint.vout,
            value = funding.value,
            "funding input attached"
        );

        Ok(Self {
            tx,
            funding: Some(funding),
            network: ctx.network(),
            phase: Phase::Collecting,
        })
    }

    /// Script-only assembly: no funding, no input, nothing signable.
    /// Only useful for synthesizing redeem scripts via [`add_record`].
    ///
    /// [`add_record`]: Self::add_record
    pub fn script_only(ctx: &RunContext) -> Self {
        Self {
            tx: Transaction::new(),
            funding: None,
            network: ctx.network(),
            phase: Phase::Collecting,
        }
    }

    /// Appends the output for `record` and writes the resulting script
    /// material back onto it: the redeem script when time-constrained,
    /// and the index the output took in this transaction.
    ///
    /// Records with `days_for_payment == 0` pay the recipient's address
    /// directly. Time-constrained records are wrapped in a pay-to-script-
    /// hash output over a freshly built time-lock redeem script, which
    /// requires the recipient to be identified by public key.
    pub fn add_record(
        &mut self,
        record: &mut DistributionRecord,
    ) -> Result<(), TransactionError> {
        self.require_phase(Phase::Collecting)?;

        let script_pubkey = match record.unlock_at_millis() {
            None => Script::p2pkh(record.recipient().address(self.network).hash160()),
            Some(unlock_at) => {
                // Parsing guarantees a public key for vesting rows.
                let pubkey = record
                    .recipient()
                    .public_key()
                    .ok_or(TransactionError::TimeLockWithoutPublicKey)?;
                let redeem = RedeemScript::time_locked(pubkey, unlock_at);
                let locking = redeem.locking_script();
                record.set_redeem_script(redeem);
                locking
            }
        };

        let index = self.tx.outputs.len() as u32;
        self.tx.outputs.push(TxOut {
            value: record.amount(),
            script_pubkey,
        });
        record.set_output_index(index);
        debug!(alias = record.alias(), index, amount = record.amount(), "output appended");
        Ok(())
    }

    /// Total value of the outputs collected so far, smallest units.
    pub fn collected_value(&self) -> u64 {
        self.tx.total_output_value()
    }

    /// Value of the funding output, if this assembler spends one.
    pub fn funding_value(&self) -> Option<u64> {
        self.funding.as_ref().map(|f| f.value)
    }

    /// Signs, balances change back to `change_address`, and runs the final
    /// structural checks. Consumes the collecting phase: a second call is
    /// a phase violation.
    pub fn finalize(
        &mut self,
        signer: &dyn Signer,
        change_address: &Address,
        fee: FeePolicy,
    ) -> Result<&Transaction, TransactionError> {
        self.require_phase(Phase::Collecting)?;
        let funding = self
            .funding
            .as_ref()
            .ok_or(TransactionError::InputCount(0))?;

        signer.complete_and_sign(&mut self.tx, funding, change_address, fee)?;
        validation::validate_outgoing(&self.tx, change_address)?;

        self.phase = Phase::Finalized;
        info!(
            txid = %self.tx.txid(),
            outputs = self.tx.outputs.len(),
            total = self.tx.total_output_value(),
            "transaction finalized"
        );
        Ok(&self.tx)
    }

    /// The transaction in its current state, finished or not. Used to
    /// show the operator what was built when a late check fails.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    fn require_phase(&self, expected: Phase) -> Result<(), TransactionError> {
        if self.phase != expected {
            return Err(TransactionError::PhaseViolation {
                expected: expected.name(),
                found: self.phase.name(),
            });
        }
        Ok(())
    }
}
