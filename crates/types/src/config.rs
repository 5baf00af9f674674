//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{BroadcastMode, NamespaceId};

/// Largest square size the DA layer accepts.
pub const MAX_SQUARE_SIZE: u64 = 128;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Address the RPC server listens on (host:port).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Default namespace for retrieval requests that omit one.
    pub namespace_id: NamespaceId,

    /// Path to the height ledger file. Relative paths resolve against the home directory.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Deadline applied to every inbound request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How many messages a retrieval expects per DA height.
    #[serde(default)]
    pub retrieval_mode: RetrievalMode,

    /// DA network endpoints.
    pub da: DaConfig,

    /// Block submission parameters.
    #[serde(default)]
    pub submitter: SubmitterConfig,

    /// Signing key location.
    #[serde(default)]
    pub keyring: KeyringConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:4200".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("height_map.json")
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

/// Message cardinality expected per DA height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Zero or more messages; zero is an empty result.
    #[default]
    Multi,
    /// Exactly one message; anything else is a consistency error.
    Single,
}

/// DA network configuration.
///
/// Transactions and queries may be served by different nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaConfig {
    /// Endpoint for account queries and transaction broadcast.
    #[serde(alias = "rpc_address")]
    pub tx_endpoint: String,

    /// Endpoint for block and share queries.
    #[serde(alias = "rest_rpc_address")]
    pub query_endpoint: String,

    /// Bearer token sent to both endpoints (empty string if not required).
    #[serde(default)]
    pub auth_token: String,

    /// Chain id transactions are signed for.
    pub chain_id: String,
}

/// Block submission configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitterConfig {
    /// Gas limit set on every pay-for-message transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Fee paid per transaction.
    #[serde(default = "default_fee_amount")]
    pub fee_amount: u64,

    /// Fee denomination.
    #[serde(default = "default_denom")]
    pub denom: String,

    /// Broadcast mode.
    #[serde(default)]
    pub broadcast_mode: BroadcastMode,

    /// Candidate square sizes offered when signing. Each must be a power of two
    /// no larger than [`MAX_SQUARE_SIZE`].
    #[serde(default = "default_square_sizes")]
    pub square_sizes: Vec<u64>,
}

fn default_gas_limit() -> u64 {
    2_000_000
}

fn default_fee_amount() -> u64 {
    1
}

fn default_denom() -> String {
    "tia".to_string()
}

fn default_square_sizes() -> Vec<u64> {
    vec![MAX_SQUARE_SIZE]
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            gas_limit: default_gas_limit(),
            fee_amount: default_fee_amount(),
            denom: default_denom(),
            broadcast_mode: BroadcastMode::default(),
            square_sizes: default_square_sizes(),
        }
    }
}

/// Where the signing key lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyringBackend {
    /// Hex key file at `<path>/<account_name>.key`.
    #[default]
    File,
    /// Ephemeral key generated at startup.
    Memory,
}

/// Keyring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Backend.
    #[serde(default)]
    pub backend: KeyringBackend,

    /// Keyring directory. Relative paths resolve against the home directory.
    #[serde(default = "default_keyring_path")]
    pub path: PathBuf,

    /// Name of the signing account.
    #[serde(default = "default_account_name")]
    pub account_name: String,
}

fn default_keyring_path() -> PathBuf {
    PathBuf::from("keys")
}

fn default_account_name() -> String {
    "dalc".to_string()
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            backend: KeyringBackend::default(),
            path: default_keyring_path(),
            account_name: default_account_name(),
        }
    }
}

impl KeyringConfig {
    /// Path of the key file for the configured account.
    #[must_use]
    pub fn key_file(&self) -> PathBuf {
        self.path.join(format!("{}.key", self.account_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg: BridgeConfig = toml::from_str(
            r#"
            namespace_id = "0102030405060708"

            [da]
            tx_endpoint = "http://127.0.0.1:9090"
            query_endpoint = "http://127.0.0.1:26658"
            chain_id = "test"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.listen_addr, "127.0.0.1:4200");
        assert_eq!(cfg.retrieval_mode, RetrievalMode::Multi);
        assert_eq!(cfg.submitter, SubmitterConfig::default());
        assert_eq!(cfg.submitter.square_sizes, vec![MAX_SQUARE_SIZE]);
        assert_eq!(cfg.keyring.key_file(), PathBuf::from("keys/dalc.key"));
    }

    #[test]
    fn test_broadcast_mode_and_backend_names() {
        let cfg: SubmitterConfig = toml::from_str(
            r#"
            broadcast_mode = "sync"
            square_sizes = [128, 64, 32, 16]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.broadcast_mode, BroadcastMode::Sync);
        assert_eq!(cfg.square_sizes.len(), 4);

        let keyring: KeyringConfig = toml::from_str(r#"backend = "memory""#).unwrap();
        assert_eq!(keyring.backend, KeyringBackend::Memory);
    }
}
