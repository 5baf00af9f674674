//! Block retrieval and availability checks.

use std::sync::Arc;

use dalc_types::{NamespaceId, RetrievalMode, RollupBlock};
use tracing::{debug, warn};

use crate::message::{decode_block, parse_messages, Message};
use crate::{AvailabilityHeaderResolver, CallContext, DaError, Result, ShareService};

/// Outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Sampling confirmed the block.
    Available,
    /// Sampling did not confirm the block, with the node's reason.
    Unavailable(String),
}

impl Availability {
    /// Whether the block was confirmed available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Fetches namespaced shares and decodes them back into rollup blocks.
pub struct BlockRetriever {
    resolver: Arc<AvailabilityHeaderResolver>,
    shares: Arc<dyn ShareService>,
}

impl BlockRetriever {
    /// Create a retriever.
    #[must_use]
    pub fn new(resolver: Arc<AvailabilityHeaderResolver>, shares: Arc<dyn ShareService>) -> Self {
        Self { resolver, shares }
    }

    /// Blocks posted under `namespace` at `da_height`, in share order.
    ///
    /// In [`RetrievalMode::Multi`] an empty namespace yields no blocks and
    /// messages that fail to decode are skipped. In [`RetrievalMode::Single`]
    /// exactly one message must be present and it must decode.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Consistency`] on malformed framing or, in single mode,
    /// a message count other than one. Network errors are returned unchanged.
    pub async fn retrieve(
        &self,
        ctx: &CallContext,
        da_height: u64,
        namespace: NamespaceId,
        mode: RetrievalMode,
    ) -> Result<Vec<RollupBlock>> {
        let header = self.resolver.resolve(ctx, da_height).await?;
        let shares = ctx
            .run(
                "fetch namespace shares",
                self.shares.shares_by_namespace(&header, namespace),
            )
            .await?;

        let messages: Vec<Message> = parse_messages(&shares)?
            .into_iter()
            .filter(|m| {
                let keep = m.namespace == namespace;
                if !keep {
                    warn!(
                        da_height,
                        expected = %namespace,
                        got = %m.namespace,
                        "Skipping message from another namespace"
                    );
                }
                keep
            })
            .collect();

        debug!(
            da_height,
            %namespace,
            shares = shares.len(),
            messages = messages.len(),
            "Fetched namespace messages"
        );

        match mode {
            RetrievalMode::Single => {
                let [message] = <[Message; 1]>::try_from(messages).map_err(|found| {
                    DaError::Consistency(format!(
                        "expected exactly one message in namespace {namespace} at DA height {da_height}, found {}",
                        found.len()
                    ))
                })?;
                Ok(vec![decode_block(&message.data)?])
            }
            RetrievalMode::Multi => Ok(messages
                .iter()
                .filter_map(|m| match decode_block(&m.data) {
                    Ok(block) => Some(block),
                    Err(e) => {
                        warn!(
                            da_height,
                            %namespace,
                            error = %e,
                            "Skipping message that failed to decode"
                        );
                        None
                    }
                })
                .collect()),
        }
    }

    /// Whether share sampling confirms the block at `da_height` is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be resolved or the share service
    /// cannot be reached. A failed sample is [`Availability::Unavailable`].
    pub async fn check_availability(
        &self,
        ctx: &CallContext,
        da_height: u64,
    ) -> Result<Availability> {
        let header = self.resolver.resolve(ctx, da_height).await?;

        match ctx
            .run("sample shares", self.shares.shares_available(&header))
            .await
        {
            Ok(()) => Ok(Availability::Available),
            Err(DaError::Unavailable(reason)) => {
                debug!(da_height, %reason, "Sampling did not confirm availability");
                Ok(Availability::Unavailable(reason))
            }
            Err(e) => Err(e),
        }
    }
}
