//! # Distribution Constants & Network Parameters
//!
//! Every magic number in the distributor lives here. Several of these carry
//! consensus weight — the premined supply cap, the output-count bounds, the
//! confirmation depth — and changing them changes what the validator will
//! let out the door. Choose wisely.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Monetary Units
// ---------------------------------------------------------------------------

/// Smallest indivisible units per whole Fermat. Input files are denominated
/// in whole Fermats; everything past the parser is denominated in units.
pub const COIN: u64 = 100_000_000;

/// Total premined supply in whole Fermats. No single distribution row may
/// exceed this, because no single row can be paid more than everything.
pub const PREMINED_SUPPLY: u64 = 2_100_000;

// ---------------------------------------------------------------------------
// Transaction Shape
// ---------------------------------------------------------------------------

/// An outgoing distribution spends exactly one input: the genesis output.
pub const REQUIRED_INPUT_COUNT: usize = 1;

/// Minimum output count. Two, because a distribution with no change path
/// back to the operator is a distribution we refuse to sign.
pub const MIN_OUTPUT_COUNT: usize = 2;

/// Maximum output count per distribution transaction. Larger batches are
/// split across runs rather than producing an oversized transaction.
pub const MAX_OUTPUT_COUNT: usize = 50;

/// Length of a compressed secp256k1 public key, which is the only recipient
/// key form the redeem script accepts.
pub const COMPRESSED_PUBKEY_LENGTH: usize = 33;

// ---------------------------------------------------------------------------
// Funding Preconditions
// ---------------------------------------------------------------------------

/// Required confirmation depth of the genesis transaction before we will
/// spend it in normal operation.
pub const CONFIRMATION_DEPTH: u32 = 6;

/// Reduced confirmation depth accepted in test mode (`-t`).
pub const TEST_CONFIRMATION_DEPTH: u32 = 1;

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

/// How long we wait for the broadcast collaborator before declaring the run
/// failed. A timeout here does NOT mean the transaction did not propagate.
pub const BROADCAST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Audit Log
// ---------------------------------------------------------------------------

/// Well-known filename of the append-only execution log, created in the
/// working directory. Kept byte-identical to the historical tool so existing
/// audit trails keep accumulating in the same place.
pub const OUTPUT_LOG_FILE: &str = "preMiningDistributor.output";

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// The Fermat networks a distribution can target.
///
/// Each network carries its own Base58 version bytes, so a mainnet key or
/// address simply does not parse on testnet and vice versa. That is a
/// feature: the premine key must never be confused across networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// The real deal. Mistakes here cost real money.
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network, reduced peer requirements.
    Regtest,
}

impl Network {
    /// Base58Check version byte for pay-to-pubkey-hash addresses.
    /// Mainnet addresses start with `p`.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x75,
            Network::Testnet | Network::Regtest => 0x82,
        }
    }

    /// Base58Check version byte for pay-to-script-hash addresses.
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0xae,
            Network::Testnet | Network::Regtest => 0x31,
        }
    }

    /// Base58Check version byte for WIF-encoded private keys.
    pub fn wif_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x31,
            Network::Testnet | Network::Regtest => 0x4c,
        }
    }

    /// Minimum peer acknowledgements required before a broadcast counts as
    /// propagated. One peer suffices against a local regtest node.
    pub fn min_broadcast_peers(&self) -> u32 {
        match self {
            Network::Regtest => 1,
            _ => 2,
        }
    }

    /// Human display name, matching the `-n` CLI values.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "main",
            Network::Testnet => "test",
            Network::Regtest => "regtest",
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting Helpers
// ---------------------------------------------------------------------------

/// Formats an amount of smallest units as a friendly whole-Fermat string,
/// e.g. `12.50 FRM`. Trailing zeros are trimmed down to two decimals.
pub fn format_coins(units: u64) -> String {
    let whole = units / COIN;
    let frac = units % COIN;
    let mut decimals = format!("{:08}", frac);
    while decimals.len() > 2 && decimals.ends_with('0') {
        decimals.pop();
    }
    format!("{}.{} FRM", whole, decimals)
}

/// Formats an amount of smallest units as a plain whole-Fermat decimal with
/// no currency suffix, used when echoing input rows back into the audit log.
pub fn format_plain(units: u64) -> String {
    let whole = units / COIN;
    let frac = units % COIN;
    if frac == 0 {
        format!("{}", whole)
    } else {
        let mut decimals = format!("{:08}", frac);
        while decimals.ends_with('0') {
            decimals.pop();
        }
        format!("{}.{}", whole, decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn networks_have_distinct_version_bytes() {
        assert_ne!(
            Network::Mainnet.p2pkh_version(),
            Network::Testnet.p2pkh_version()
        );
        assert_ne!(
            Network::Mainnet.wif_version(),
            Network::Regtest.wif_version()
        );
    }

    #[test]
    fn regtest_needs_a_single_peer() {
        assert_eq!(Network::Regtest.min_broadcast_peers(), 1);
        assert_eq!(Network::Mainnet.min_broadcast_peers(), 2);
        assert_eq!(Network::Testnet.min_broadcast_peers(), 2);
    }

    #[test]
    fn friendly_format_trims_trailing_zeros() {
        assert_eq!(format_coins(COIN), "1.00 FRM");
        assert_eq!(format_coins(COIN / 2), "0.50 FRM");
        assert_eq!(format_coins(123_456_789), "1.23456789 FRM");
        assert_eq!(format_coins(0), "0.00 FRM");
    }

    #[test]
    fn plain_format_is_decimal_coins() {
        assert_eq!(format_plain(500 * COIN), "500");
        assert_eq!(format_plain(COIN + COIN / 4), "1.25");
    }
}
