//! DA bridge error types.

use std::time::Duration;

/// Coarse classification of a [`DaError`], used to pick wire response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rollup height already mapped. Not retried.
    Conflict,
    /// No mapping, or no data at the requested height.
    NotFound,
    /// Network unreachable, timeout or cancellation. The caller decides on retry.
    Transport,
    /// Malformed input from the DA layer. Fatal for the request.
    Consistency,
    /// Local failure (encoding, signing, storage, configuration).
    Internal,
}

/// Errors that can occur in the DA bridge pipeline.
///
/// Every collaborator boundary translates into this enum, so callers never
/// match on collaborator-specific error shapes.
#[derive(Debug, thiserror::Error)]
pub enum DaError {
    /// Rollup height already has a DA height recorded.
    #[error(
        "rollup block at height {rollup_height} is already associated with DA height {existing_da_height}"
    )]
    AlreadyMapped {
        /// Rollup height.
        rollup_height: u64,
        /// DA height recorded earlier.
        existing_da_height: u64,
    },

    /// No DA height is recorded for the rollup height.
    #[error("no associated DA block for rollup block at height {rollup_height}")]
    NoAssociatedBlock {
        /// Rollup height.
        rollup_height: u64,
    },

    /// The DA layer has nothing at the requested height.
    #[error("DA height {da_height} not found: {reason}")]
    NotFound {
        /// DA height.
        da_height: u64,
        /// Detail from the DA node.
        reason: String,
    },

    /// Failed to reach the DA node.
    #[error("transport error: {0}")]
    Transport(String),

    /// A collaborator call exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Deadline that was exceeded.
        after: Duration,
    },

    /// A collaborator call was cancelled by the caller.
    #[error("{operation} was cancelled")]
    Cancelled {
        /// Operation that was cancelled.
        operation: &'static str,
    },

    /// Share sampling could not confirm availability.
    #[error("data unavailable: {0}")]
    Unavailable(String),

    /// DA data violates a structural invariant.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Failed to encode data.
    #[error("failed to encode: {0}")]
    EncodeFailed(String),

    /// Failed to decode data.
    #[error("failed to decode: {0}")]
    DecodeFailed(String),

    /// Signing or account lookup failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Ledger persistence failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DaError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyMapped { .. } => ErrorKind::Conflict,
            Self::NoAssociatedBlock { .. } | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Transport(_)
            | Self::Timeout { .. }
            | Self::Cancelled { .. }
            | Self::Unavailable(_) => ErrorKind::Transport,
            Self::Consistency(_) => ErrorKind::Consistency,
            Self::EncodeFailed(_)
            | Self::DecodeFailed(_)
            | Self::Signing(_)
            | Self::Storage(_)
            | Self::InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    /// Whether the call never completed because of a deadline or cancellation.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled { .. })
    }
}
