//! DA bridge pipeline.
//!
//! This crate posts rollup blocks to a data-availability network as namespaced
//! messages, records which DA height stores each rollup height, and proves
//! availability and returns block content by height.
//!
//! The network itself is reached through the collaborator traits defined
//! here ([`Signer`], [`TxBroadcaster`], [`ChainClient`], [`ShareService`],
//! [`AccountSource`]) and erasure coding through [`SquareCodec`].

#![warn(missing_docs)]

mod availability;
mod client;
mod context;
mod error;
mod keyring;
mod ledger;
mod message;
mod retriever;
mod service;
mod square;
mod submitter;

#[cfg(test)]
mod mock;

pub use availability::AvailabilityHeaderResolver;
pub use client::DaNodeClient;
pub use context::CallContext;
pub use error::{DaError, ErrorKind};
pub use keyring::{account_address, generate_key, load_key, KeyringSigner, SignedTx, TxBody};
pub use ledger::HeightLedger;
pub use message::{
    decode_block, encode_block, parse_messages, share_commitment, split_messages, Message,
};
pub use retriever::{Availability, BlockRetriever};
pub use service::BridgeService;
pub use square::{AvailabilityHeader, ExtendedDataSquare, SquareCodec, XorSquareCodec};
pub use submitter::{validate_square_sizes, BlockSubmitter, PayForMessage, ShareCommitment};

use dalc_types::{BroadcastMode, NamespaceId, Share};
use serde::{Deserialize, Serialize};

/// Result type for DA bridge operations.
pub type Result<T> = std::result::Result<T, DaError>;

/// Fee attached to a pay-for-message transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee amount.
    pub amount: u64,
    /// Fee denomination.
    pub denom: String,
    /// Gas limit.
    pub gas_limit: u64,
}

/// Chain response to a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    /// Result code; zero means accepted.
    pub code: u32,
    /// Chain log, carrying the rejection reason on nonzero codes.
    #[serde(default)]
    pub raw_log: String,
    /// Inclusion height. Zero when the mode returned before inclusion.
    #[serde(default)]
    pub height: u64,
    /// Gas used.
    #[serde(default)]
    pub gas_used: u64,
    /// Transaction hash (hex).
    #[serde(default)]
    pub tx_hash: String,
}

/// On-chain account state needed to sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Account number.
    pub account_number: u64,
    /// Next sequence number.
    pub sequence: u64,
}

/// Produces signed, encoded pay-for-message transactions.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// Refresh account number and sequence from the chain.
    ///
    /// Must be called before [`Signer::sign_and_encode`].
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown or the chain is unreachable.
    async fn query_account_state(&self) -> Result<()>;

    /// Sign `payload` with `fee` and return the encoded transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the account state is unknown or signing fails.
    async fn sign_and_encode(&self, payload: &PayForMessage, fee: &Fee) -> Result<Vec<u8>>;
}

/// Sends encoded transactions to the chain.
#[async_trait::async_trait]
pub trait TxBroadcaster: Send + Sync {
    /// Broadcast `tx` and wait as `mode` dictates.
    ///
    /// A nonzero [`BroadcastResponse::code`] is a successful round trip.
    ///
    /// # Errors
    ///
    /// Returns an error only if the chain could not be reached.
    async fn broadcast(&self, tx: Vec<u8>, mode: BroadcastMode) -> Result<BroadcastResponse>;
}

/// Raw block access by DA height.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Original (non-extended) shares of the block at `height`, in square order.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::NotFound`] if there is no block at `height`.
    async fn block_shares(&self, height: u64) -> Result<Vec<Share>>;
}

/// Share sampling and namespace queries.
#[async_trait::async_trait]
pub trait ShareService: Send + Sync {
    /// Sample the block committed to by `header`.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Unavailable`] if sampling failed, or a transport error.
    async fn shares_available(&self, header: &AvailabilityHeader) -> Result<()>;

    /// All shares tagged with `namespace` in the block committed to by `header`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shares cannot be fetched.
    async fn shares_by_namespace(
        &self,
        header: &AvailabilityHeader,
        namespace: NamespaceId,
    ) -> Result<Vec<Share>>;
}

/// Account lookups used by the keyring signer.
#[async_trait::async_trait]
pub trait AccountSource: Send + Sync {
    /// Current state of the account at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Signing`] for unknown accounts, or a transport error.
    async fn account(&self, address: &str) -> Result<AccountState>;
}
