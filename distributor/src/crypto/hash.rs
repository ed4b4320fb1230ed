//! Hash functions with consensus weight.
//!
//! The ledger speaks double-SHA-256 for transaction ids and signature
//! digests, and hash160 for address and script commitments. Both are thin
//! compositions over `sha2` and `ripemd`; there is no NIH hashing here.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of the input, as a fixed 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Double SHA-256: `SHA256(SHA256(data))`.
///
/// Used for transaction ids and signature hashes.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// hash160: `RIPEMD160(SHA256(data))`, the 20-byte commitment used for
/// pay-to-pubkey-hash and pay-to-script-hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(sha));
    out
}
