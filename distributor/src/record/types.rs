//! The per-recipient distribution record.

use std::fmt;

use crate::config::format_coins;
use crate::context::RunContext;
use crate::crypto::keys::Recipient;
use crate::script::RedeemScript;

/// One recipient's entitlement in a distribution run.
///
/// Created once by the parser and immutable afterwards, except for the two
/// slots the assembler fills in while building outputs: the synthesized
/// redeem script and the on-ledger output index. Both start empty and are
/// written at most once, which keeps the record queryable for script reveal
/// after assembly without making it broadly mutable.
#[derive(Debug, Clone)]
pub struct DistributionRecord {
    alias: String,
    recipient: Recipient,
    amount: u64,
    days_for_payment: u32,
    unlock_at_millis: Option<i64>,
    redeem_script: Option<RedeemScript>,
    output_index: Option<u32>,
}

impl DistributionRecord {
    /// A record payable immediately.
    pub fn new(alias: String, recipient: Recipient, amount: u64) -> Self {
        Self {
            alias,
            recipient,
            amount,
            days_for_payment: 0,
            unlock_at_millis: None,
            redeem_script: None,
            output_index: None,
        }
    }

    /// A time-constrained record. The absolute unlock instant is computed
    /// here, once, from the run context — every record in a run shares the
    /// same reference epoch.
    pub fn with_vesting(
        alias: String,
        recipient: Recipient,
        amount: u64,
        days_for_payment: u32,
        ctx: &RunContext,
    ) -> Self {
        Self {
            alias,
            recipient,
            amount,
            days_for_payment,
            unlock_at_millis: Some(ctx.unlock_at(days_for_payment)),
            redeem_script: None,
            output_index: None,
        }
    }

    /// The recipient's display alias, verbatim from the input file.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The recipient's identity (public key or address).
    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    /// Amount in smallest indivisible units.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The vesting delay in days; zero for immediately payable records.
    pub fn days_for_payment(&self) -> u32 {
        self.days_for_payment
    }

    /// True when this record's funds are locked until a future instant.
    pub fn is_time_constrained(&self) -> bool {
        self.unlock_at_millis.is_some()
    }

    /// The absolute unlock instant, for time-constrained records.
    pub fn unlock_at_millis(&self) -> Option<i64> {
        self.unlock_at_millis
    }

    /// The redeem script synthesized during assembly, once available.
    pub fn redeem_script(&self) -> Option<&RedeemScript> {
        self.redeem_script.as_ref()
    }

    /// The index of this record's output in the built transaction, once
    /// assigned.
    pub fn output_index(&self) -> Option<u32> {
        self.output_index
    }

    pub(crate) fn set_redeem_script(&mut self, redeem: RedeemScript) {
        self.redeem_script = Some(redeem);
    }

    pub(crate) fn set_output_index(&mut self, index: u32) {
        self.output_index = Some(index);
    }
}

impl fmt::Display for DistributionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.alias, format_coins(self.amount))?;
        if let Some(unlock) = self.unlock_at_millis {
            write!(f, " (locked until epoch {})", unlock)?;
        }
        Ok(())
    }
}
