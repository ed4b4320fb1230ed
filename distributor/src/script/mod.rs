//! # Output Script Model
//!
//! A deliberately small script representation: just enough to build and
//! recognize the three locking forms this tool emits (pay-to-pubkey-hash,
//! pay-to-script-hash, and the time-locked redeem script), and to serialize
//! them byte-for-byte the way the ledger's consensus rules expect.
//!
//! This is *not* a script interpreter. Execution belongs to the network;
//! we only construct and decode.

pub mod redeem;

use std::fmt;

use thiserror::Error;

use crate::crypto::hash::hash160;

pub use redeem::RedeemScript;

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

/// The closed set of opcodes the distributor emits or recognizes.
///
/// Each maps to its fixed consensus byte. Data pushes are not opcodes here;
/// they are [`ScriptChunk::Push`] and serialize with their own length
/// prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Duplicate the top stack item.
    Dup,
    /// Drop the top stack item.
    Drop,
    /// Pop and compare two items for equality.
    Equal,
    /// `Equal` then fail unless true.
    EqualVerify,
    /// hash160 the top stack item.
    Hash160,
    /// Verify a signature against a public key.
    CheckSig,
    /// BIP65 absolute time lock: fail until the pushed locktime is reached.
    CheckLockTimeVerify,
}

impl Opcode {
    /// The consensus byte for this opcode.
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Dup => 0x76,
            Opcode::Drop => 0x75,
            Opcode::Equal => 0x87,
            Opcode::EqualVerify => 0x88,
            Opcode::Hash160 => 0xa9,
            Opcode::CheckSig => 0xac,
            Opcode::CheckLockTimeVerify => 0xb1,
        }
    }

    /// Decodes a consensus byte into an opcode we understand.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x76 => Some(Opcode::Dup),
            0x75 => Some(Opcode::Drop),
            0x87 => Some(Opcode::Equal),
            0x88 => Some(Opcode::EqualVerify),
            0xa9 => Some(Opcode::Hash160),
            0xac => Some(Opcode::CheckSig),
            0xb1 => Some(Opcode::CheckLockTimeVerify),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chunks and Scripts
// ---------------------------------------------------------------------------

/// One element of a script: either a data push or an opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptChunk {
    /// Push the contained bytes onto the stack.
    Push(Vec<u8>),
    /// Execute an opcode.
    Op(Opcode),
}

/// Errors from decoding script bytes.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A push ran past the end of the script.
    #[error("push of {wanted} bytes overruns script at offset {offset}")]
    TruncatedPush {
        /// Bytes the push claimed.
        wanted: usize,
        /// Offset of the push opcode.
        offset: usize,
    },

    /// An opcode byte outside the set this tool understands.
    #[error("unsupported opcode 0x{0:02x}")]
    UnsupportedOpcode(u8),
}

/// An ordered chunk sequence with deterministic byte serialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    chunks: Vec<ScriptChunk>,
}

impl Script {
    /// Builds a script from an explicit chunk sequence.
    pub fn from_chunks(chunks: Vec<ScriptChunk>) -> Self {
        Self { chunks }
    }

    /// The chunk sequence, in execution order.
    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    /// Serializes to consensus bytes. Pushes up to 75 bytes use the direct
    /// length opcode; longer pushes use PUSHDATA1/PUSHDATA2. Deterministic:
    /// identical chunks always produce identical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for chunk in &self.chunks {
            match chunk {
                ScriptChunk::Push(data) => {
                    let len = data.len();
                    if len <= 75 {
                        bytes.push(len as u8);
                    } else if len <= 255 {
                        bytes.push(0x4c);
                        bytes.push(len as u8);
                    } else {
                        bytes.push(0x4d);
                        bytes.extend_from_slice(&(len as u16).to_le_bytes());
                    }
                    bytes.extend_from_slice(data);
                }
                ScriptChunk::Op(op) => bytes.push(op.to_byte()),
            }
        }
        bytes
    }

    /// Decodes consensus bytes back into chunks. Fails on truncated pushes
    /// and on opcodes outside the supported set.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        let mut chunks = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if (0x01..=0x4b).contains(&b) {
                let len = b as usize;
                if i + 1 + len > bytes.len() {
                    return Err(ScriptError::TruncatedPush {
                        wanted: len,
                        offset: i,
                    });
                }
                chunks.push(ScriptChunk::Push(bytes[i + 1..i + 1 + len].to_vec()));
                i += 1 + len;
            } else if b == 0x4c {
                if i + 1 >= bytes.len() {
                    return Err(ScriptError::TruncatedPush { wanted: 1, offset: i });
                }
                let len = bytes[i + 1] as usize;
                if i + 2 + len > bytes.len() {
                    return Err(ScriptError::TruncatedPush {
                        wanted: len,
                        offset: i,
                    });
                }
                chunks.push(ScriptChunk::Push(bytes[i + 2..i + 2 + len].to_vec()));
                i += 2 + len;
            } else if b == 0x4d {
                if i + 2 >= bytes.len() {
                    return Err(ScriptError::TruncatedPush { wanted: 2, offset: i });
                }
                let len = u16::from_le_bytes([bytes[i + 1], bytes[i + 2]]) as usize;
                if i + 3 + len > bytes.len() {
                    return Err(ScriptError::TruncatedPush {
                        wanted: len,
                        offset: i,
                    });
                }
                chunks.push(ScriptChunk::Push(bytes[i + 3..i + 3 + len].to_vec()));
                i += 3 + len;
            } else if let Some(op) = Opcode::from_byte(b) {
                chunks.push(ScriptChunk::Op(op));
                i += 1;
            } else {
                return Err(ScriptError::UnsupportedOpcode(b));
            }
        }
        Ok(Self { chunks })
    }

    // -- locking templates --------------------------------------------------

    /// Pay-to-pubkey-hash locking script:
    /// `OP_DUP OP_HASH160 <hash160> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn p2pkh(pubkey_hash: [u8; 20]) -> Self {
        Self::from_chunks(vec![
            ScriptChunk::Op(Opcode::Dup),
            ScriptChunk::Op(Opcode::Hash160),
            ScriptChunk::Push(pubkey_hash.to_vec()),
            ScriptChunk::Op(Opcode::EqualVerify),
            ScriptChunk::Op(Opcode::CheckSig),
        ])
    }

    /// Pay-to-script-hash locking script:
    /// `OP_HASH160 <hash160(redeem)> OP_EQUAL`.
    pub fn p2sh(script_hash: [u8; 20]) -> Self {
        Self::from_chunks(vec![
            ScriptChunk::Op(Opcode::Hash160),
            ScriptChunk::Push(script_hash.to_vec()),
            ScriptChunk::Op(Opcode::Equal),
        ])
    }

    /// Pay-to-pubkey-hash unlocking script: `<signature> <pubkey>`.
    pub fn p2pkh_sig(signature: &[u8], pubkey: &[u8]) -> Self {
        Self::from_chunks(vec![
            ScriptChunk::Push(signature.to_vec()),
            ScriptChunk::Push(pubkey.to_vec()),
        ])
    }

    // -- recognizers ---------------------------------------------------------

    /// When this is a pay-to-pubkey-hash locking script, the hash it pays to.
    pub fn p2pkh_destination(&self) -> Option<[u8; 20]> {
        match self.chunks.as_slice() {
            [ScriptChunk::Op(Opcode::Dup), ScriptChunk::Op(Opcode::Hash160), ScriptChunk::Push(hash), ScriptChunk::Op(Opcode::EqualVerify), ScriptChunk::Op(Opcode::CheckSig)]
                if hash.len() == 20 =>
            {
                let mut out = [0u8; 20];
                out.copy_from_slice(hash);
                Some(out)
            }
            _ => None,
        }
    }

    /// True when this is a pay-to-script-hash locking script.
    pub fn is_p2sh(&self) -> bool {
        matches!(
            self.chunks.as_slice(),
            [ScriptChunk::Op(Opcode::Hash160), ScriptChunk::Push(hash), ScriptChunk::Op(Opcode::Equal)]
                if hash.len() == 20
        )
    }

    /// hash160 of the serialized script, i.e. the P2SH commitment.
    pub fn script_hash(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for chunk in &self.chunks {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match chunk {
                ScriptChunk::Push(data) => write!(f, "<{}>", hex::encode(data))?,
                ScriptChunk::Op(op) => write!(f, "{:?}", op)?,
            }
        }
        Ok(())
    }
}
