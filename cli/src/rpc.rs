//! # JSON-RPC Collaborators
//!
//! Implements the library's wallet and broadcast traits over the JSON-RPC
//! interface of a trusted node. The node holds no keys of value until the
//! operator key is imported for the run; all signing happens locally.
//!
//! Peer acknowledgements are approximated: the node's own acceptance of
//! the raw transaction plus its live connection count stand in for
//! per-peer confirmations, since the RPC surface does not expose them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use fermat_distributor::config::COIN;
use fermat_distributor::crypto::{Address, PrivateKey};
use fermat_distributor::env::{
    BroadcastError, Broadcaster, FundingError, FundingOutput, FundingWallet,
};
use fermat_distributor::script::Script;
use fermat_distributor::transaction::{OutPoint, Transaction, Txid};

/// Label under which the operator key is imported for the run.
const IMPORT_LABEL: &str = "premine-distribution";

/// Thin JSON-RPC 1.0 client over HTTP.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct UnspentEntry {
    txid: String,
    vout: u32,
    /// Whole-coin amount as the node reports it.
    amount: f64,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    confirmations: u32,
}

#[derive(Debug, Deserialize)]
struct RawTransactionEntry {
    vin: Vec<Value>,
}

impl RpcClient {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc call");
        let body = json!({ "jsonrpc": "1.0", "id": id, "method": method, "params": params });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("{method}: transport failure: {e}"))?;
        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| format!("{method}: malformed response: {e}"))?;

        if let Some(err) = parsed.error {
            return Err(format!("{method}: node error {}: {}", err.code, err.message));
        }
        parsed
            .result
            .ok_or_else(|| format!("{method}: empty result"))
    }

    /// Converts the node's whole-coin float to smallest units.
    fn to_units(amount: f64) -> u64 {
        (amount * COIN as f64).round() as u64
    }

    fn funding_output(
        entry: &UnspentEntry,
        funding_input_count: usize,
    ) -> Result<FundingOutput, FundingError> {
        let txid = Txid::from_hex(&entry.txid)
            .map_err(|e| FundingError::Backend(format!("bad txid from node: {e}")))?;
        let script_bytes = hex::decode(&entry.script_pub_key)
            .map_err(|e| FundingError::Backend(format!("bad script from node: {e}")))?;
        let script_pubkey = Script::from_bytes(&script_bytes)
            .map_err(|e| FundingError::Backend(format!("undecodable script from node: {e}")))?;
        Ok(FundingOutput {
            outpoint: OutPoint {
                txid,
                vout: entry.vout,
            },
            value: Self::to_units(entry.amount),
            script_pubkey,
            confirmations: entry.confirmations,
            funding_input_count,
        })
    }
}

#[async_trait]
impl FundingWallet for RpcClient {
    async fn import_key(&self, key: &PrivateKey) -> Result<(), FundingError> {
        // Rescan so the genesis output becomes visible immediately.
        self.call::<Value>(
            "importprivkey",
            json!([key.to_wif(), IMPORT_LABEL, true]),
        )
        .await
        .map(|_| ())
        .map_err(FundingError::Backend)
    }

    async fn available_balance(&self) -> Result<u64, FundingError> {
        let balance: f64 = self
            .call("getbalance", json!([]))
            .await
            .map_err(FundingError::Backend)?;
        Ok(Self::to_units(balance))
    }

    async fn single_unspent(&self) -> Result<FundingOutput, FundingError> {
        let mut unspent: Vec<UnspentEntry> = self
            .call("listunspent", json!([]))
            .await
            .map_err(FundingError::Backend)?;

        let entry = match unspent.len() {
            0 => return Err(FundingError::NoUnspentOutput),
            1 => unspent.remove(0),
            n => return Err(FundingError::MultipleUnspentOutputs(n)),
        };
        if entry.amount <= 0.0 {
            return Err(FundingError::ZeroBalance);
        }

        // The funding transaction itself must be inspected for its input
        // count; the unspent listing does not carry it.
        let raw: RawTransactionEntry = self
            .call("getrawtransaction", json!([entry.txid, true]))
            .await
            .map_err(FundingError::Backend)?;

        Self::funding_output(&entry, raw.vin.len())
    }

    async fn imported_addresses(&self) -> Result<Vec<Address>, FundingError> {
        let labeled: BTreeMap<String, Value> = self
            .call("getaddressesbylabel", json!([IMPORT_LABEL]))
            .await
            .map_err(FundingError::Backend)?;
        labeled
            .keys()
            .map(|s| {
                Address::from_base58(s)
                    .map_err(|e| FundingError::Backend(format!("bad address from node: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl Broadcaster for RpcClient {
    async fn broadcast(
        &self,
        tx: &Transaction,
        min_peer_acks: u32,
    ) -> Result<Txid, BroadcastError> {
        let peers: u64 = self
            .call("getconnectioncount", json!([]))
            .await
            .map_err(BroadcastError::Transport)?;
        if peers < u64::from(min_peer_acks) {
            warn!(peers, min_peer_acks, "fewer peers connected than desired");
        }

        let raw = hex::encode(tx.serialize());
        let txid: String = self
            .call("sendrawtransaction", json!([raw]))
            .await
            .map_err(BroadcastError::Rejected)?;
        Txid::from_hex(&txid)
            .map_err(|e| BroadcastError::Transport(format!("bad txid from node: {e}")))
    }
}
