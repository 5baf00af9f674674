//! Request handling for the bridge.
//!
//! [`BridgeService`] composes the ledger, submitter and retriever, and is the
//! only place the ledger is written. A rollup height moves from unsubmitted to
//! submitted exactly once.

use std::sync::Arc;

use dalc_types::{rpc::HeightRef, NamespaceId, RetrievalMode, RollupBlock, SubmissionResult};
use tracing::{debug, error, info, warn};

use crate::{
    Availability, BlockRetriever, BlockSubmitter, CallContext, DaError, HeightLedger, Result,
};

/// Bridge facade serving submit, availability and retrieval requests.
pub struct BridgeService {
    ledger: Arc<HeightLedger>,
    submitter: BlockSubmitter,
    retriever: BlockRetriever,
    namespace: NamespaceId,
    mode: RetrievalMode,
}

impl BridgeService {
    /// Create a service.
    ///
    /// `namespace` is used for retrievals that do not name one.
    #[must_use]
    pub fn new(
        ledger: Arc<HeightLedger>,
        submitter: BlockSubmitter,
        retriever: BlockRetriever,
        namespace: NamespaceId,
        mode: RetrievalMode,
    ) -> Self {
        Self {
            ledger,
            submitter,
            retriever,
            namespace,
            mode,
        }
    }

    /// Height ledger backing this service.
    #[must_use]
    pub fn ledger(&self) -> &HeightLedger {
        &self.ledger
    }

    /// Default retrieval namespace.
    #[must_use]
    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    /// Submit `block` unless its height was submitted before.
    ///
    /// On success with a known inclusion height the mapping is recorded.
    /// Rejections are returned as `Ok` and leave the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::AlreadyMapped`] if the height is already recorded,
    /// including when a concurrent submission for the same height recorded
    /// first. Submission errors are returned unchanged.
    pub async fn submit_block(
        &self,
        ctx: &CallContext,
        block: &RollupBlock,
    ) -> Result<SubmissionResult> {
        let rollup_height = block.height();

        if let Some(existing_da_height) = self.ledger.lookup(rollup_height).await {
            debug!(rollup_height, existing_da_height, "Rejecting resubmission");
            return Err(DaError::AlreadyMapped {
                rollup_height,
                existing_da_height,
            });
        }

        let result = match self.submitter.submit(ctx, block).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_timeout() {
                    warn!(
                        rollup_height,
                        error = %e,
                        "Submission outcome unknown, the transaction may still be included"
                    );
                }
                return Err(e);
            }
        };

        if !result.is_success() {
            return Ok(result);
        }

        let Some(da_height) = result.da_height else {
            warn!(
                rollup_height,
                tx_hash = %result.tx_hash,
                "No inclusion height reported, mapping not recorded"
            );
            return Ok(result);
        };

        if let Err(e) = self.ledger.record(rollup_height, da_height).await {
            // The DA layer holds this block but the ledger does not point at it.
            error!(
                rollup_height,
                da_height,
                tx_hash = %result.tx_hash,
                error = %e,
                "Reconciliation required: block broadcast but mapping not recorded"
            );
            return Err(e);
        }

        info!(rollup_height, da_height, "Recorded submission");
        Ok(result)
    }

    /// Whether the block referenced by `height` is available.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::NoAssociatedBlock`] for an unmapped rollup height,
    /// or whatever the availability check failed with.
    pub async fn check_block_availability(
        &self,
        ctx: &CallContext,
        height: HeightRef,
    ) -> Result<Availability> {
        let da_height = self.resolve_height(height).await?;
        self.retriever.check_availability(ctx, da_height).await
    }

    /// Blocks stored at the DA height referenced by `height`.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::NoAssociatedBlock`] for an unmapped rollup height,
    /// or whatever the retrieval failed with.
    pub async fn retrieve_blocks(
        &self,
        ctx: &CallContext,
        height: HeightRef,
        namespace: Option<NamespaceId>,
    ) -> Result<Vec<RollupBlock>> {
        let da_height = self.resolve_height(height).await?;
        let namespace = namespace.unwrap_or(self.namespace);
        self.retriever
            .retrieve(ctx, da_height, namespace, self.mode)
            .await
    }

    async fn resolve_height(&self, height: HeightRef) -> Result<u64> {
        match height {
            HeightRef::Da(da_height) => Ok(da_height),
            HeightRef::Rollup(rollup_height) => self
                .ledger
                .lookup(rollup_height)
                .await
                .ok_or(DaError::NoAssociatedBlock { rollup_height }),
        }
    }
}
