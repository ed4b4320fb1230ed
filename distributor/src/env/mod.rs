//! # External Collaborator Interfaces
//!
//! The distributor deliberately knows nothing about peer discovery, chain
//! sync, or wallet internals. It consumes two narrow traits:
//!
//! - [`FundingWallet`] — where the genesis output and operator key live;
//! - [`Broadcaster`] — how the finished transaction reaches the network.
//!
//! Production wires these to a trusted ledger node over JSON-RPC (see the
//! CLI crate); tests wire them to in-memory doubles. Either way the core
//! pipeline is identical, which is the point.

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::keys::{Address, PrivateKey};
use crate::script::Script;
use crate::transaction::{OutPoint, Transaction, Txid};

// ---------------------------------------------------------------------------
// FundingOutput
// ---------------------------------------------------------------------------

/// The single unspent output holding the entire premined balance, as
/// reported by the funding wallet.
///
/// Besides the outpoint and value, it carries the two facts the structural
/// validator needs about the funding *transaction*: its confirmation depth
/// and its own input count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingOutput {
    /// Where the funds sit on the ledger.
    pub outpoint: OutPoint,
    /// Value in smallest units.
    pub value: u64,
    /// The locking script we will be signing against.
    pub script_pubkey: Script,
    /// Blocks on top of the funding transaction.
    pub confirmations: u32,
    /// Input count of the funding transaction itself. The expected premine
    /// genesis has exactly one.
    pub funding_input_count: usize,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Funding preconditions that failed before any transaction was assembled.
#[derive(Debug, Error)]
pub enum FundingError {
    /// The wallet holds no unspent output at all — wrong key, or nothing
    /// to distribute.
    #[error("no unspent funding output found; possible wrong private key, can't go on without coins")]
    NoUnspentOutput,

    /// More than one unspent output. The premine wallet must never reach
    /// this state; manual intervention required.
    #[error("{0} unspent outputs found where exactly one was expected; manual intervention required")]
    MultipleUnspentOutputs(usize),

    /// The wallet reports a zero spendable balance.
    #[error("available balance is zero after sync; can't go on without coins")]
    ZeroBalance,

    /// The requested total exceeds what the wallet holds.
    #[error("insufficient balance: trying to send {requested} with only {available} available")]
    InsufficientBalance {
        /// Total the distribution requires, smallest units.
        requested: u64,
        /// What the wallet reports, smallest units.
        available: u64,
    },

    /// The operator key is not among the wallet's imported keys.
    #[error("the funding key is not imported in the wallet")]
    KeyNotImported,

    /// The collaborator itself failed (transport, RPC, serialization).
    #[error("funding wallet error: {0}")]
    Backend(String),
}

/// Broadcast failures. All fatal to the run; none retried automatically,
/// since a second attempt races a possibly-propagated first one.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The bounded wait elapsed. The transaction MAY still have propagated.
    #[error("broadcast timed out after {seconds}s; the transaction may still have propagated")]
    Timeout {
        /// The bound that elapsed.
        seconds: u64,
    },

    /// The network rejected the transaction outright.
    #[error("broadcast rejected: {0}")]
    Rejected(String),

    /// Transport-level failure before any acknowledgement.
    #[error("broadcast transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The wallet collaborator holding the premined funds.
///
/// Read-only except for [`FundingWallet::import_key`], which is an
/// environment-setup step performed once before the pipeline runs.
#[async_trait]
pub trait FundingWallet {
    /// Makes the operator key known to the wallet so it can recognize the
    /// genesis output as spendable.
    async fn import_key(&self, key: &PrivateKey) -> Result<(), FundingError>;

    /// Spendable balance in smallest units, after sync.
    async fn available_balance(&self) -> Result<u64, FundingError>;

    /// The single unspent funding output. Zero or more than one is a
    /// fatal precondition failure, reported as such.
    async fn single_unspent(&self) -> Result<FundingOutput, FundingError>;

    /// Addresses of the wallet's imported keys.
    async fn imported_addresses(&self) -> Result<Vec<Address>, FundingError>;
}

/// The network collaborator that propagates the finished transaction.
#[async_trait]
pub trait Broadcaster {
    /// Broadcasts `tx` and resolves once the backend accepts it.
    /// `min_peer_acks` is the desired propagation breadth; implementations
    /// whose backend cannot report per-peer acknowledgements treat it as
    /// advisory. The caller bounds the wait with a timeout.
    async fn broadcast(&self, tx: &Transaction, min_peer_acks: u32)
        -> Result<Txid, BroadcastError>;
}
