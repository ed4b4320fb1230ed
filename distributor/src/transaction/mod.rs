//! # Transaction Assembly
//!
//! Construction, completion, signing, and structural validation of the one
//! distribution transaction a run produces.
//!
//! ```text
//! types.rs      — Wire types: Txid, OutPoint, TxIn, TxOut, Transaction
//! assembler.rs  — The three-phase assembler (Initialized → Populated → Finalized)
//! signing.rs    — The Signer contract and the local secp256k1 implementation
//! validation.rs — Structural invariants enforced before broadcast
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Initialize** — consume the single genesis funding output as input.
//! 2. **Populate** — one output per distribution record, in record order.
//! 3. **Finalize** — balance (change back to the operator), sign, validate.
//!
//! The phases are strictly sequential and none repeats. The structural
//! validator gets the last word: a transaction it refuses never reaches the
//! broadcaster.

pub mod assembler;
pub mod signing;
pub mod types;
pub mod validation;

pub use assembler::TransactionAssembler;
pub use signing::{FeePolicy, LocalSigner, Signer};
pub use types::{OutPoint, Transaction, TxIn, TxOut, Txid};
pub use validation::TransactionError;
