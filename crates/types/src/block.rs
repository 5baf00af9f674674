//! Rollup block types.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{NamespaceId, Transaction};

/// Hash of a rollup block header.
pub type BlockHash = B256;

/// Rollup block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Rollup height.
    pub height: u64,

    /// Namespace the block is posted under in the DA layer.
    pub namespace_id: NamespaceId,

    /// Timestamp (unix seconds).
    pub timestamp: u64,

    /// Hash of the previous rollup header.
    pub last_header_hash: BlockHash,

    /// Proposer address.
    pub proposer: Address,
}

/// Ordered rollup transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    /// Raw transactions.
    pub txs: Vec<Transaction>,
}

/// Signature over a rollup block by one of its validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSig {
    /// Validator address.
    pub validator: Address,

    /// Opaque signature bytes.
    #[serde(with = "crate::serde_helpers::hex_vec")]
    pub signature: Vec<u8>,
}

/// Commit for the previous rollup block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Height the commit is for.
    pub height: u64,

    /// Validator signatures.
    pub signatures: Vec<CommitSig>,
}

/// A complete rollup block.
///
/// Immutable once constructed; the DA pipeline only serializes and
/// deserializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupBlock {
    /// Block header.
    pub header: BlockHeader,

    /// Block body.
    pub data: BlockData,

    /// Commit for the previous block.
    pub last_commit: Commit,
}

impl RollupBlock {
    /// Create a new block with an empty commit.
    #[must_use]
    pub fn new(header: BlockHeader, txs: Vec<Transaction>) -> Self {
        let last_commit = Commit {
            height: header.height.saturating_sub(1),
            signatures: Vec::new(),
        };
        Self {
            header,
            data: BlockData { txs },
            last_commit,
        }
    }

    /// Rollup height.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Namespace the block belongs to.
    #[must_use]
    pub fn namespace_id(&self) -> NamespaceId {
        self.header.namespace_id
    }

    /// Number of transactions in this block.
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.data.txs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(height: u64) -> BlockHeader {
        BlockHeader {
            height,
            namespace_id: NamespaceId::new([1, 2, 3, 4, 5, 6, 7, 8]),
            timestamp: 1_700_000_000,
            last_header_hash: B256::ZERO,
            proposer: Address::ZERO,
        }
    }

    #[test]
    fn test_block_accessors() {
        let txs = vec![Transaction::new(vec![1]), Transaction::new(vec![2, 3])];
        let block = RollupBlock::new(header(7), txs);
        assert_eq!(block.height(), 7);
        assert_eq!(block.tx_count(), 2);
        assert_eq!(block.last_commit.height, 6);
        assert_eq!(block.namespace_id().as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_bincode_roundtrip_is_deep_equal() {
        let txs = vec![
            Transaction::new(vec![1]),
            Transaction::new(vec![2]),
            Transaction::new(vec![3, 4]),
        ];
        let mut block = RollupBlock::new(header(3), txs);
        block.last_commit.signatures.push(CommitSig {
            validator: Address::repeat_byte(0x11),
            signature: vec![9; 64],
        });

        let bytes = bincode::serialize(&block).unwrap();
        let decoded: RollupBlock = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, block);
    }
}
