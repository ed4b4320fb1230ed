//! Time-locked redeem script synthesis.
//!
//! A vesting output is locked as pay-to-script-hash over a five-chunk
//! redeem script:
//!
//! ```text
//! <unlock_time: 8 bytes, big-endian> OP_CHECKLOCKTIMEVERIFY OP_DROP
//! <recipient pubkey: 33 bytes> OP_CHECKSIG
//! ```
//!
//! The layout is fixed. Chunk order, push widths, and the big-endian
//! encoding of the unlock time are all consensus-visible; the eventual
//! spender reproduces this script verbatim to redeem, so synthesis must be
//! byte-for-byte deterministic.

use std::fmt;

use secp256k1::PublicKey;

use super::{Opcode, Script, ScriptChunk};

/// A synthesized time-locked spending condition, paired with the unlock
/// instant it encodes.
///
/// Pure value: synthesizing twice from the same key and instant yields
/// byte-identical scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemScript {
    script: Script,
    unlock_at_millis: i64,
}

impl RedeemScript {
    /// Synthesizes the redeem script for `pubkey`, spendable once
    /// `unlock_at_millis` has been reached.
    pub fn time_locked(pubkey: &PublicKey, unlock_at_millis: i64) -> Self {
        let script = Script::from_chunks(vec![
            ScriptChunk::Push((unlock_at_millis as u64).to_be_bytes().to_vec()),
            ScriptChunk::Op(Opcode::CheckLockTimeVerify),
            ScriptChunk::Op(Opcode::Drop),
            ScriptChunk::Push(pubkey.serialize().to_vec()),
            ScriptChunk::Op(Opcode::CheckSig),
        ]);
        Self {
            script,
            unlock_at_millis,
        }
    }

    /// The raw redeem script. This is what the recipient must present when
    /// the lock expires; without it, P2SH funds are unrecoverable.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// The absolute unlock instant encoded in the first chunk.
    pub fn unlock_at_millis(&self) -> i64 {
        self.unlock_at_millis
    }

    /// Serialized redeem-script bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.script.to_bytes()
    }

    /// The pay-to-script-hash locking script committing to this redeem
    /// script, used as the actual output-locking condition when funding.
    pub fn locking_script(&self) -> Script {
        Script::p2sh(self.script.script_hash())
    }
}

impl fmt::Display for RedeemScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pubkey() -> PublicKey {
        // The secp256k1 generator point, compressed.
        let bytes =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        PublicKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn five_chunks_in_fixed_order() {
        let redeem = RedeemScript::time_locked(&test_pubkey(), 1_700_000_000_000);
        let chunks = redeem.script().chunks();
        assert_eq!(chunks.len(), 5);
        assert!(matches!(&chunks[0], ScriptChunk::Push(t) if t.len() == 8));
        assert_eq!(chunks[1], ScriptChunk::Op(Opcode::CheckLockTimeVerify));
        assert_eq!(chunks[2], ScriptChunk::Op(Opcode::Drop));
        assert!(matches!(&chunks[3], ScriptChunk::Push(k) if k.len() == 33));
        assert_eq!(chunks[4], ScriptChunk::Op(Opcode::CheckSig));
    }

    #[test]
    fn unlock_time_is_big_endian() {
        let redeem = RedeemScript::time_locked(&test_pubkey(), 0x0102030405060708);
        match &redeem.script().chunks()[0] {
            ScriptChunk::Push(t) => {
                assert_eq!(t.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
            }
            other => panic!("expected a push, found {:?}", other),
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        let a = RedeemScript::time_locked(&test_pubkey(), 1_700_000_000_000);
        let b = RedeemScript::time_locked(&test_pubkey(), 1_700_000_000_000);
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.locking_script(), b.locking_script());
    }

    #[test]
    fn decoding_the_bytes_reproduces_the_chunks() {
        let redeem = RedeemScript::time_locked(&test_pubkey(), 1_700_000_000_000);
        let decoded = Script::from_bytes(&redeem.to_bytes()).unwrap();
        assert_eq!(decoded.chunks(), redeem.script().chunks());
    }

    #[test]
    fn locking_script_is_p2sh_over_script_hash() {
        let redeem = RedeemScript::time_locked(&test_pubkey(), 42);
        let locking = redeem.locking_script();
        assert!(locking.is_p2sh());
        assert_eq!(locking, Script::p2sh(redeem.script().script_hash()));
    }
}
