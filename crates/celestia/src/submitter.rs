//! Block submission.
//!
//! Packages a rollup block into a signed pay-for-message transaction,
//! broadcasts it, and translates the chain's response into a
//! [`SubmissionResult`]. The ledger is not touched here.

use std::sync::Arc;

use dalc_types::{
    BroadcastMode, NamespaceId, RollupBlock, StatusCode, SubmissionResult, SubmitterConfig,
    MAX_SQUARE_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::message::{encode_block, share_commitment, Message};
use crate::{BroadcastResponse, CallContext, DaError, Fee, Result, Signer, TxBroadcaster};

/// Commitment to a message's shares for one candidate square size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCommitment {
    /// Square size the commitment was computed for.
    pub square_size: u64,
    /// Merkle root over the message's share rows.
    pub commitment: [u8; 32],
}

/// Payload paying for inclusion of one namespaced message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayForMessage {
    /// Namespace the message is posted under.
    pub namespace: NamespaceId,
    /// Message bytes.
    pub message: Vec<u8>,
    /// One commitment per candidate square size, in configured order.
    pub commitments: Vec<ShareCommitment>,
}

/// Check a candidate square size set.
///
/// # Errors
///
/// Returns [`DaError::InvalidConfig`] if the set is empty, or any size is not a
/// power of two or exceeds [`MAX_SQUARE_SIZE`].
pub fn validate_square_sizes(sizes: &[u64]) -> Result<()> {
    if sizes.is_empty() {
        return Err(DaError::InvalidConfig(
            "at least one square size is required".into(),
        ));
    }
    for &size in sizes {
        if !size.is_power_of_two() {
            return Err(DaError::InvalidConfig(format!(
                "square size {size} is not a power of two"
            )));
        }
        if size > MAX_SQUARE_SIZE {
            return Err(DaError::InvalidConfig(format!(
                "square size {size} exceeds maximum {MAX_SQUARE_SIZE}"
            )));
        }
    }
    Ok(())
}

/// Submits rollup blocks to the DA layer.
pub struct BlockSubmitter {
    signer: Arc<dyn Signer>,
    broadcaster: Arc<dyn TxBroadcaster>,
    fee: Fee,
    mode: BroadcastMode,
    square_sizes: Vec<u64>,
}

impl BlockSubmitter {
    /// Create a submitter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured square sizes are invalid.
    pub fn new(
        signer: Arc<dyn Signer>,
        broadcaster: Arc<dyn TxBroadcaster>,
        config: &SubmitterConfig,
    ) -> Result<Self> {
        validate_square_sizes(&config.square_sizes)?;

        Ok(Self {
            signer,
            broadcaster,
            fee: Fee {
                amount: config.fee_amount,
                denom: config.denom.clone(),
                gas_limit: config.gas_limit,
            },
            mode: config.broadcast_mode,
            square_sizes: config.square_sizes.clone(),
        })
    }

    /// Build the pay-for-message payload for `block`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be serialized.
    pub fn build_payload(&self, block: &RollupBlock) -> Result<PayForMessage> {
        let namespace = block.namespace_id();
        let message = Message::new(namespace, encode_block(block)?);
        let shares = message.to_shares();

        let commitments = self
            .square_sizes
            .iter()
            .map(|&square_size| ShareCommitment {
                square_size,
                commitment: share_commitment(&shares, square_size),
            })
            .collect();

        Ok(PayForMessage {
            namespace,
            message: message.data,
            commitments,
        })
    }

    /// Sign and broadcast `block`.
    ///
    /// A chain rejection is returned as `Ok` with [`StatusCode::Error`].
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails, or the chain cannot be
    /// reached before the context's deadline.
    pub async fn submit(&self, ctx: &CallContext, block: &RollupBlock) -> Result<SubmissionResult> {
        let rollup_height = block.height();
        let payload = self.build_payload(block)?;

        debug!(
            rollup_height,
            namespace = %payload.namespace,
            message_len = payload.message.len(),
            square_sizes = ?self.square_sizes,
            "Submitting block"
        );

        ctx.run("query account", self.signer.query_account_state())
            .await?;
        let tx = self.signer.sign_and_encode(&payload, &self.fee).await?;
        let response = ctx
            .run("broadcast", self.broadcaster.broadcast(tx, self.mode))
            .await?;

        let result = translate(response);
        match (result.status, result.da_height) {
            (StatusCode::Success, Some(da_height)) => info!(
                rollup_height,
                da_height,
                gas_used = result.gas_used,
                tx_hash = %result.tx_hash,
                "Block submitted"
            ),
            (StatusCode::Success, None) => warn!(
                rollup_height,
                mode = ?self.mode,
                tx_hash = %result.tx_hash,
                "Block accepted without an inclusion height"
            ),
            _ => warn!(rollup_height, message = %result.message, "Block rejected"),
        }

        Ok(result)
    }
}

fn translate(response: BroadcastResponse) -> SubmissionResult {
    if response.code != 0 {
        return SubmissionResult {
            status: StatusCode::Error,
            message: format!(
                "failed to submit tx: code {}: {}",
                response.code, response.raw_log
            ),
            da_height: None,
            gas_used: response.gas_used,
            tx_hash: response.tx_hash,
        };
    }

    SubmissionResult {
        status: StatusCode::Success,
        message: String::new(),
        da_height: (response.height > 0).then_some(response.height),
        gas_used: response.gas_used,
        tx_hash: response.tx_hash,
    }
}
