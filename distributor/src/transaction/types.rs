//! Wire-level transaction types.
//!
//! The serialization is the ledger's legacy format: little-endian fixed
//! integers, varint-prefixed collections, scripts as length-prefixed byte
//! strings. The transaction id is the double-SHA-256 of the full
//! serialization, so identical inputs always produce the identical id —
//! determinism the rest of the crate leans on.

use std::fmt;

use crate::crypto::hash::double_sha256;
use crate::script::Script;

// ---------------------------------------------------------------------------
// Txid
// ---------------------------------------------------------------------------

/// A transaction id: the double-SHA-256 of the serialized transaction,
/// displayed as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Txid([u8; 32]);

impl Txid {
    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex id.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let decoded = hex::decode(s)?;
        let mut bytes = [0u8; 32];
        if decoded.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// OutPoint / TxIn / TxOut
// ---------------------------------------------------------------------------

/// A reference to one output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutPoint {
    /// Id of the transaction being spent.
    pub txid: Txid,
    /// Index of the output within that transaction.
    pub vout: u32,
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    /// The output this input spends.
    pub previous_output: OutPoint,
    /// Unlocking script; empty until signing installs it.
    pub script_sig: Script,
    /// Sequence number. Always final here: the distribution carries its
    /// locktimes inside redeem scripts, not on the transaction.
    pub sequence: u32,
}

impl TxIn {
    /// An unsigned input spending `previous_output`.
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::default(),
            sequence: 0xffff_ffff,
        }
    }
}

/// A transaction output: an amount and the condition that locks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in smallest units.
    pub value: u64,
    /// The locking script.
    pub script_pubkey: Script,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// The distribution transaction under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Format version. Always 1 for this tool.
    pub version: u32,
    /// Ordered inputs; exactly one after assembly.
    pub inputs: Vec<TxIn>,
    /// Ordered outputs; index order is consensus-visible.
    pub outputs: Vec<TxOut>,
    /// Transaction-level locktime. Unused (zero); vesting locks live in the
    /// per-output redeem scripts.
    pub lock_time: u32,
}

impl Transaction {
    /// An empty version-1 transaction.
    pub fn new() -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Serializes to the legacy wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&self.version.to_le_bytes());

        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(input.previous_output.txid.as_bytes());
            buf.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            let script = input.script_sig.to_bytes();
            write_varint(&mut buf, script.len() as u64);
            buf.extend_from_slice(&script);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            let script = output.script_pubkey.to_bytes();
            write_varint(&mut buf, script.len() as u64);
            buf.extend_from_slice(&script);
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// The transaction id of the current contents.
    pub fn txid(&self) -> Txid {
        Txid::from_bytes(double_sha256(&self.serialize()))
    }

    /// Sum of all output values. Saturates rather than wraps; callers
    /// validate against the funding value separately.
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value))
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "transaction {}", self.txid())?;
        for input in &self.inputs {
            writeln!(
                f,
                "  in:  {}:{}",
                input.previous_output.txid, input.previous_output.vout
            )?;
        }
        for (index, output) in self.outputs.iter().enumerate() {
            writeln!(
                f,
                "  out: #{index} {} [{}]",
                output.value, output.script_pubkey
            )?;
        }
        Ok(())
    }
}

/// Writes a Bitcoin-style variable-length integer.
fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TxIn::new(OutPoint {
            txid: Txid::from_bytes([0xaa; 32]),
            vout: 0,
        }));
        tx.outputs.push(TxOut {
            value: 5_000,
            script_pubkey: Script::p2pkh([0x11; 20]),
        });
        tx.outputs.push(TxOut {
            value: 7_000,
            script_pubkey: Script::p2sh([0x22; 20]),
        });
        tx
    }

    #[test]
    fn txid_is_deterministic() {
        assert_eq!(sample_tx().txid(), sample_tx().txid());
    }

    #[test]
    fn txid_changes_with_contents() {
        let a = sample_tx();
        let mut b = sample_tx();
        b.outputs[0].value += 1;
        assert_ne!(a.txid(), b.txid());
    }

    #[test]
    fn serialization_layout() {
        let tx = sample_tx();
        let bytes = tx.serialize();
        // version
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        // input count
        assert_eq!(bytes[4], 1);
        // previous txid
        assert_eq!(&bytes[5..37], &[0xaa; 32]);
        // vout
        assert_eq!(&bytes[37..41], &0u32.to_le_bytes());
        // empty script_sig
        assert_eq!(bytes[41], 0);
        // sequence
        assert_eq!(&bytes[42..46], &0xffff_ffffu32.to_le_bytes());
        // output count
        assert_eq!(bytes[46], 2);
        // locktime trailer
        assert_eq!(&bytes[bytes.len() - 4..], &0u32.to_le_bytes());
    }

    #[test]
    fn txid_hex_round_trip() {
        let txid = sample_tx().txid();
        assert_eq!(Txid::from_hex(&txid.to_string()).unwrap(), txid);
    }

    #[test]
    fn total_output_value_sums_outputs() {
        assert_eq!(sample_tx().total_output_value(), 12_000);
    }
}
