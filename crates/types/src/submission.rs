//! Submission outcomes and height mappings.

use serde::{Deserialize, Serialize};

/// Closed status code set reported to bridge clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    /// No outcome could be determined.
    #[default]
    Unspecified,
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

/// How the broadcaster waits after handing a transaction to the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Wait until the transaction is included in a block.
    #[default]
    Block,
    /// Wait for the mempool check only.
    Sync,
    /// Return immediately.
    Async,
}

impl BroadcastMode {
    /// Numeric code used on the chain's broadcast endpoint.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Block => 1,
            Self::Sync => 2,
            Self::Async => 3,
        }
    }
}

/// Outcome of a broadcast attempt.
///
/// A chain-side rejection is a `SubmissionResult` with [`StatusCode::Error`],
/// not an error value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Outcome.
    pub status: StatusCode,

    /// Chain raw log on rejection, empty on success.
    pub message: String,

    /// DA height the message was included at. `None` on rejection, or when the
    /// broadcast mode returned before inclusion.
    pub da_height: Option<u64>,

    /// Gas used by the transaction.
    pub gas_used: u64,

    /// Transaction hash (hex).
    pub tx_hash: String,
}

impl SubmissionResult {
    /// Whether the chain accepted the transaction.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::Success
    }
}

/// Rollup height to DA height correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightMapping {
    /// Rollup block height.
    pub rollup_height: u64,
    /// DA height storing that block.
    pub da_height: u64,
}
