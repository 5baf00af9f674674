//! Core types for the DALC bridge.
//!
//! This crate provides the data model shared by the DA pipeline and the node
//! binary: rollup blocks, namespaces, shares, submission outcomes, the RPC wire
//! types and configuration.

#![warn(missing_docs)]

mod block;
mod config;
mod namespace;
pub mod rpc;
pub mod serde_helpers;
mod share;
mod submission;
mod transaction;

pub use block::{BlockData, BlockHash, BlockHeader, Commit, CommitSig, RollupBlock};
pub use config::{
    BridgeConfig, DaConfig, KeyringBackend, KeyringConfig, RetrievalMode, SubmitterConfig,
    MAX_SQUARE_SIZE,
};
pub use namespace::{InvalidNamespace, NamespaceId, NAMESPACE_ID_SIZE};
pub use share::{Share, MESSAGE_SHARE_DATA_SIZE, SHARE_SIZE};
pub use submission::{BroadcastMode, HeightMapping, StatusCode, SubmissionResult};
pub use transaction::Transaction;

/// Re-export commonly used types from alloy.
pub mod primitives {
    pub use alloy_primitives::{Address, B256};
}
