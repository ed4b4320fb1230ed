//! Keys, addresses, and recipient identities.
//!
//! Recipients in the input file may be named by either a compressed
//! secp256k1 public key (66 hex characters) or a Base58Check ledger address.
//! The two forms are mutually exclusive and carry different capabilities:
//! only a full public key can back a time-constrained redeem script, since
//! the script embeds the key itself rather than its hash.
//!
//! The operator's funding key arrives WIF-encoded and is bound to a network
//! by its version byte, so a mainnet premine key cannot be replayed against
//! testnet by accident.

use std::fmt;

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use crate::config::{Network, COMPRESSED_PUBKEY_LENGTH};
use crate::crypto::hash::{double_sha256, hash160};

/// Errors produced while decoding keys, addresses, or recipient fields.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The Base58 payload failed to decode at all.
    #[error("invalid base58 encoding: {0}")]
    InvalidBase58(String),

    /// The trailing 4-byte checksum did not match the payload.
    #[error("base58 checksum mismatch")]
    BadChecksum,

    /// The decoded payload had an unexpected length.
    #[error("unexpected payload length: {0} bytes")]
    BadLength(usize),

    /// A key or address carries the version byte of a different network.
    #[error("wrong network: expected version 0x{expected:02x}, found 0x{found:02x}")]
    WrongNetwork {
        /// Version byte required by the selected network.
        expected: u8,
        /// Version byte actually present.
        found: u8,
    },

    /// The bytes are not a valid point on the curve.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] secp256k1::Error),

    /// The field is neither a 33-byte hex public key nor a valid address.
    #[error("recipient `{0}` is neither a compressed public key nor a valid address")]
    UnrecognizedRecipient(String),
}

// ---------------------------------------------------------------------------
// Base58Check
// ---------------------------------------------------------------------------

/// Base58Check-encodes `payload` (version byte already included) by
/// appending the first four bytes of its double-SHA-256.
fn base58check_encode(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);
    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

/// Decodes a Base58Check string and verifies its checksum. Returns the
/// payload with the version byte still attached.
fn base58check_decode(s: &str) -> Result<Vec<u8>, KeyError> {
    let decoded = bs58::decode(s)
        .into_vec()
        .map_err(|e| KeyError::InvalidBase58(e.to_string()))?;
    if decoded.len() < 5 {
        return Err(KeyError::BadLength(decoded.len()));
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    let computed = double_sha256(payload);
    if checksum != &computed[..4] {
        return Err(KeyError::BadChecksum);
    }
    Ok(payload.to_vec())
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A Base58Check ledger address: one version byte plus a 20-byte hash160.
///
/// The version byte distinguishes both the network and the address kind
/// (pay-to-pubkey-hash vs pay-to-script-hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    version: u8,
    hash: [u8; 20],
}

impl Address {
    /// Derives the pay-to-pubkey-hash address of a compressed public key on
    /// the given network.
    pub fn from_pubkey(pubkey: &PublicKey, network: Network) -> Self {
        Self {
            version: network.p2pkh_version(),
            hash: hash160(&pubkey.serialize()),
        }
    }

    /// Wraps a script hash as a pay-to-script-hash address.
    pub fn p2sh(script_hash: [u8; 20], network: Network) -> Self {
        Self {
            version: network.p2sh_version(),
            hash: script_hash,
        }
    }

    /// Parses a Base58Check address, verifying length and checksum. The
    /// version byte is accepted as-is; callers that care about the network
    /// check it via [`Address::is_p2pkh_on`].
    pub fn from_base58(s: &str) -> Result<Self, KeyError> {
        let payload = base58check_decode(s)?;
        if payload.len() != 21 {
            return Err(KeyError::BadLength(payload.len()));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self {
            version: payload[0],
            hash,
        })
    }

    /// The 20-byte hash160 this address commits to.
    pub fn hash160(&self) -> [u8; 20] {
        self.hash
    }

    /// The raw version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// True when this is a pay-to-pubkey-hash address on `network`.
    pub fn is_p2pkh_on(&self, network: Network) -> bool {
        self.version == network.p2pkh_version()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = vec![self.version];
        payload.extend_from_slice(&self.hash);
        write!(f, "{}", base58check_encode(&payload))
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// The operator's funding key, decoded from WIF and bound to a network.
#[derive(Debug, Clone)]
pub struct PrivateKey {
    secret: SecretKey,
    network: Network,
}

impl PrivateKey {
    /// Decodes a WIF private key, enforcing the network's WIF version byte.
    ///
    /// Accepts both the 33-byte legacy payload and the 34-byte form with the
    /// trailing compressed-key marker; we always derive compressed public
    /// keys regardless.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, KeyError> {
        let payload = base58check_decode(wif)?;
        if payload.len() != 33 && payload.len() != 34 {
            return Err(KeyError::BadLength(payload.len()));
        }
        if payload[0] != network.wif_version() {
            return Err(KeyError::WrongNetwork {
                expected: network.wif_version(),
                found: payload[0],
            });
        }
        let secret = SecretKey::from_slice(&payload[1..33])?;
        Ok(Self { secret, network })
    }

    /// Constructs a key from raw secret bytes. Test-support path; the
    /// operator surface always goes through WIF.
    pub fn from_bytes(bytes: &[u8; 32], network: Network) -> Result<Self, KeyError> {
        Ok(Self {
            secret: SecretKey::from_slice(bytes)?,
            network,
        })
    }

    /// WIF encoding of this key (with the compressed-key marker).
    pub fn to_wif(&self) -> String {
        let mut payload = vec![self.network.wif_version()];
        payload.extend_from_slice(&self.secret.secret_bytes());
        payload.push(0x01);
        base58check_encode(&payload)
    }

    /// The compressed public key.
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        PublicKey::from_secret_key(&secp, &self.secret)
    }

    /// The pay-to-pubkey-hash address of this key on its own network.
    pub fn address(&self) -> Address {
        Address::from_pubkey(&self.public_key(), self.network)
    }

    /// The network this key is bound to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The raw secret, needed by the signer.
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// A distribution recipient's identity: a full public key or an address.
///
/// Mutually exclusive by construction. A time-constrained record requires
/// the `PublicKey` form because the redeem script pushes the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A compressed secp256k1 public key.
    PublicKey(PublicKey),
    /// A Base58Check ledger address.
    Address(Address),
}

impl Recipient {
    /// Parses a recipient field: 66 hex characters decode as a compressed
    /// public key, anything else is tried as a Base58Check address.
    pub fn parse(field: &str) -> Result<Self, KeyError> {
        if field.len() == COMPRESSED_PUBKEY_LENGTH * 2 {
            if let Ok(bytes) = hex::decode(field) {
                let key = PublicKey::from_slice(&bytes)?;
                return Ok(Recipient::PublicKey(key));
            }
        }
        match Address::from_base58(field) {
            Ok(address) => Ok(Recipient::Address(address)),
            Err(_) => Err(KeyError::UnrecognizedRecipient(field.to_string())),
        }
    }

    /// The full public key, when this recipient was given as one.
    pub fn public_key(&self) -> Option<&PublicKey> {
        match self {
            Recipient::PublicKey(key) => Some(key),
            Recipient::Address(_) => None,
        }
    }

    /// The pay-to-pubkey-hash address of this recipient on `network`,
    /// deriving it from the public key when necessary.
    pub fn address(&self, network: Network) -> Address {
        match self {
            Recipient::PublicKey(key) => Address::from_pubkey(key, network),
            Recipient::Address(address) => *address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The secp256k1 generator point, compressed. A convenient always-valid
    /// public key for tests.
    const GENERATOR_HEX: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn test_key() -> PrivateKey {
        PrivateKey::from_bytes(&[0x11; 32], Network::Regtest).unwrap()
    }

    #[test]
    fn wif_round_trip() {
        let key = test_key();
        let wif = key.to_wif();
        let decoded = PrivateKey::from_wif(&wif, Network::Regtest).unwrap();
        assert_eq!(decoded.public_key(), key.public_key());
        assert_eq!(decoded.address(), key.address());
    }

    #[test]
    fn wif_rejects_wrong_network() {
        let key = test_key();
        let wif = key.to_wif();
        let err = PrivateKey::from_wif(&wif, Network::Mainnet).unwrap_err();
        assert!(matches!(err, KeyError::WrongNetwork { .. }));
    }

    #[test]
    fn wif_rejects_corrupted_checksum() {
        let key = test_key();
        let mut wif = key.to_wif();
        // Flip the final character to break the checksum.
        let last = wif.pop().unwrap();
        wif.push(if last == '1' { '2' } else { '1' });
        assert!(PrivateKey::from_wif(&wif, Network::Regtest).is_err());
    }

    #[test]
    fn address_base58_round_trip() {
        let key = test_key();
        let address = key.address();
        let encoded = address.to_string();
        let decoded = Address::from_base58(&encoded).unwrap();
        assert_eq!(decoded, address);
        assert!(decoded.is_p2pkh_on(Network::Regtest));
        assert!(!decoded.is_p2pkh_on(Network::Mainnet));
    }

    #[test]
    fn recipient_parses_hex_public_key() {
        let recipient = Recipient::parse(GENERATOR_HEX).unwrap();
        assert!(recipient.public_key().is_some());
    }

    #[test]
    fn recipient_parses_base58_address() {
        let address = test_key().address().to_string();
        let recipient = Recipient::parse(&address).unwrap();
        assert!(recipient.public_key().is_none());
        assert_eq!(
            recipient.address(Network::Regtest).to_string(),
            address
        );
    }

    #[test]
    fn recipient_rejects_garbage() {
        assert!(Recipient::parse("not-a-key-or-address").is_err());
        // Right length for a hex key but an invalid point encoding.
        let bad = "05".repeat(33);
        assert!(Recipient::parse(&bad).is_err());
    }

    #[test]
    fn pubkey_address_derivation_is_deterministic() {
        let key = test_key();
        let a = Address::from_pubkey(&key.public_key(), Network::Mainnet);
        let b = Address::from_pubkey(&key.public_key(), Network::Mainnet);
        assert_eq!(a, b);
    }
}
