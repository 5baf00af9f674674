//! JSON-RPC client for a DA node.
//!
//! Transactions and account queries go to the transaction endpoint; block and
//! share queries go to the query endpoint. Both may point at the same node.

use dalc_types::{BroadcastMode, DaConfig, NamespaceId, Share, SHARE_SIZE};
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::http_client::{HeaderMap, HeaderValue, HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use tracing::debug;

use crate::{
    AccountSource, AccountState, AvailabilityHeader, BroadcastResponse, ChainClient, DaError,
    Result, ShareService, TxBroadcaster,
};

/// Client for a DA node's JSON-RPC API.
pub struct DaNodeClient {
    tx: HttpClient,
    query: HttpClient,
}

impl DaNodeClient {
    /// Create a client for the endpoints in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is empty or a client cannot be built.
    pub fn new(config: &DaConfig) -> Result<Self> {
        if config.tx_endpoint.is_empty() {
            return Err(DaError::InvalidConfig("tx_endpoint cannot be empty".into()));
        }
        if config.query_endpoint.is_empty() {
            return Err(DaError::InvalidConfig("query_endpoint cannot be empty".into()));
        }

        let tx = build_client(&config.tx_endpoint, &config.auth_token)?;
        let query = build_client(&config.query_endpoint, &config.auth_token)?;

        tracing::info!(
            tx_endpoint = %config.tx_endpoint,
            query_endpoint = %config.query_endpoint,
            "Connected to DA node"
        );

        Ok(Self { tx, query })
    }
}

fn build_client(url: &str, auth_token: &str) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    if !auth_token.is_empty() {
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {auth_token}"))
                .map_err(|e| DaError::InvalidConfig(format!("invalid auth token: {e}")))?,
        );
    }

    HttpClientBuilder::default()
        .set_headers(headers)
        .build(url)
        .map_err(|e| DaError::InvalidConfig(format!("failed to build HTTP client for {url}: {e}")))
}

/// Message of a JSON-RPC error reply, if `e` is one.
fn call_message(e: &ClientError) -> Option<&str> {
    match e {
        ClientError::Call(obj) => Some(obj.message()),
        _ => None,
    }
}

fn transport(method: &str, e: &ClientError) -> DaError {
    DaError::Transport(format!("{method}: {e}"))
}

/// Map a height lookup failure, treating "not found" replies as [`DaError::NotFound`].
fn lookup_error(method: &str, da_height: u64, e: &ClientError) -> DaError {
    match call_message(e) {
        Some(msg) if msg.to_ascii_lowercase().contains("not found") => DaError::NotFound {
            da_height,
            reason: msg.to_string(),
        },
        _ => transport(method, e),
    }
}

/// Validate shares returned by the node.
///
/// Shares arrive as hex strings; anything that is not exactly one share is
/// malformed DA data rather than a transport failure.
fn decode_shares(method: &str, raw: Vec<String>) -> Result<Vec<Share>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, encoded)| {
            let bytes = hex::decode(encoded.trim_start_matches("0x")).map_err(|e| {
                DaError::Consistency(format!("{method}: share {index} is not hex: {e}"))
            })?;
            let len = bytes.len();
            Share::from_raw(bytes).ok_or_else(|| {
                DaError::Consistency(format!(
                    "{method}: share {index} has {len} bytes, expected {SHARE_SIZE}"
                ))
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl TxBroadcaster for DaNodeClient {
    async fn broadcast(&self, tx: Vec<u8>, mode: BroadcastMode) -> Result<BroadcastResponse> {
        let response: BroadcastResponse = self
            .tx
            .request("tx.Broadcast", rpc_params![hex::encode(&tx), mode.code()])
            .await
            .map_err(|e| transport("tx.Broadcast", &e))?;

        debug!(
            code = response.code,
            height = response.height,
            tx_hash = %response.tx_hash,
            "Broadcast complete"
        );
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ChainClient for DaNodeClient {
    async fn block_shares(&self, height: u64) -> Result<Vec<Share>> {
        let raw: Vec<String> = self
            .query
            .request("chain.BlockShares", rpc_params![height])
            .await
            .map_err(|e| lookup_error("chain.BlockShares", height, &e))?;
        decode_shares("chain.BlockShares", raw)
    }
}

#[async_trait::async_trait]
impl ShareService for DaNodeClient {
    async fn shares_available(&self, header: &AvailabilityHeader) -> Result<()> {
        let _: serde_json::Value = self
            .query
            .request("share.SharesAvailable", rpc_params![header])
            .await
            .map_err(|e| match call_message(&e) {
                Some(msg) => DaError::Unavailable(msg.to_string()),
                None => transport("share.SharesAvailable", &e),
            })?;
        Ok(())
    }

    async fn shares_by_namespace(
        &self,
        header: &AvailabilityHeader,
        namespace: NamespaceId,
    ) -> Result<Vec<Share>> {
        let raw: Vec<String> = self
            .query
            .request("share.GetSharesByNamespace", rpc_params![header, namespace])
            .await
            .map_err(|e| transport("share.GetSharesByNamespace", &e))?;
        decode_shares("share.GetSharesByNamespace", raw)
    }
}

#[async_trait::async_trait]
impl AccountSource for DaNodeClient {
    async fn account(&self, address: &str) -> Result<AccountState> {
        self.tx
            .request("auth.Account", rpc_params![address])
            .await
            .map_err(|e| match call_message(&e) {
                Some(msg) => DaError::Signing(format!("account {address}: {msg}")),
                None => transport("auth.Account", &e),
            })
    }
}
