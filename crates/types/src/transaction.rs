//! Rollup transaction types.

use serde::{Deserialize, Serialize};

/// A raw rollup transaction carried inside a [`crate::RollupBlock`].
///
/// Transactions are opaque bytes; only the rollup interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(with = "crate::serde_helpers::hex_vec")]
    data: Vec<u8>,
}

impl Transaction {
    /// Create a new transaction from raw bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get the raw transaction bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

}
