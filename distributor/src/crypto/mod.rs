//! # Cryptographic Primitives
//!
//! Hashes, keys, and addresses for a secp256k1/UTXO ledger:
//!
//! - `hash` — SHA-256, double-SHA-256, and hash160 (SHA-256 then RIPEMD-160).
//! - `keys` — Compressed public keys, WIF private keys, Base58Check
//!   addresses, all bound to a [`crate::config::Network`].
//!
//! Nothing here rolls its own curve math; point and signature operations go
//! through the `secp256k1` crate.

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, hash160, sha256};
pub use keys::{Address, KeyError, PrivateKey, Recipient};
