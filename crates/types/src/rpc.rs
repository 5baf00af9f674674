//! Request and response types for the bridge RPC surface.

use serde::{Deserialize, Serialize};

use crate::{RollupBlock, StatusCode};

/// Reference to a block by rollup height or DA height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightRef {
    /// Rollup height, resolved to a DA height through the ledger.
    Rollup(u64),
    /// DA height, used as-is.
    Da(u64),
}

/// Common result envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaResponse {
    /// Outcome code.
    pub code: StatusCode,
    /// Human readable detail; empty on success.
    #[serde(default)]
    pub message: String,
}

impl DaResponse {
    /// A successful envelope.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: StatusCode::Success,
            message: String::new(),
        }
    }

    /// An envelope for an operation with no definite outcome.
    #[must_use]
    pub fn unspecified(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Unspecified,
            message: message.into(),
        }
    }

    /// A failed envelope.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Error,
            message: message.into(),
        }
    }
}

/// Response to `submitBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitBlockResponse {
    /// Result envelope.
    pub result: DaResponse,
    /// DA height the block landed at, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub da_height: Option<u64>,
}

/// Response to `checkBlockAvailability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckBlockAvailabilityResponse {
    /// Result envelope.
    pub result: DaResponse,
    /// Whether sampling confirmed the block is available.
    pub data_available: bool,
}

/// Response to `retrieveBlocks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveBlocksResponse {
    /// Result envelope.
    pub result: DaResponse,
    /// Decoded blocks, in share order.
    pub blocks: Vec<RollupBlock>,
}
