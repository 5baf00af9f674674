//! Availability header resolution.

use std::sync::Arc;

use tracing::debug;

use crate::{AvailabilityHeader, CallContext, ChainClient, DaError, Result, SquareCodec};

/// Derives the availability header of a DA block from its raw shares.
///
/// Holds no mutable state; concurrent calls for the same height compute equal
/// headers.
pub struct AvailabilityHeaderResolver {
    chain: Arc<dyn ChainClient>,
    codec: Arc<dyn SquareCodec>,
}

impl AvailabilityHeaderResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, codec: Arc<dyn SquareCodec>) -> Self {
        Self { chain, codec }
    }

    /// Resolve the availability header at `da_height`.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::NotFound`] if the block does not exist, and
    /// [`DaError::Consistency`] if its share count is not a nonzero perfect
    /// square.
    pub async fn resolve(&self, ctx: &CallContext, da_height: u64) -> Result<AvailabilityHeader> {
        let shares = ctx
            .run("fetch block shares", self.chain.block_shares(da_height))
            .await?;

        let square_size = square_size(shares.len()).ok_or_else(|| {
            DaError::Consistency(format!(
                "block at DA height {da_height} has {} shares, which is not a perfect square",
                shares.len()
            ))
        })?;

        let eds = self.codec.extend_shares(square_size, &shares)?;
        let header = self.codec.compute_header(&eds);

        debug!(
            da_height,
            square_size,
            header_hash = %header.hash(),
            "Resolved availability header"
        );
        Ok(header)
    }
}

/// Side length of a square holding exactly `count` shares.
fn square_size(count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    // f64 is exact for any share count a block can carry
    let root = (count as f64).sqrt().round() as usize;
    (root.checked_mul(root) == Some(count)).then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::mock::{square_of_shares, MockChain};
    use crate::XorSquareCodec;

    fn resolver(chain: MockChain) -> AvailabilityHeaderResolver {
        AvailabilityHeaderResolver::new(Arc::new(chain), Arc::new(XorSquareCodec))
    }

    #[test]
    fn test_square_size() {
        assert_eq!(square_size(1), Some(1));
        assert_eq!(square_size(4), Some(2));
        assert_eq!(square_size(16_384), Some(128));
        assert_eq!(square_size(0), None);
        assert_eq!(square_size(2), None);
        assert_eq!(square_size(7), None);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let chain = MockChain::default();
        chain.insert(10, square_of_shares(4));
        let resolver = resolver(chain);
        let ctx = CallContext::background();

        let first = resolver.resolve(&ctx, 10).await.unwrap();
        let second = resolver.resolve(&ctx, 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.width(), 8);
    }

    #[tokio::test]
    async fn test_non_square_share_count_is_rejected() {
        let chain = MockChain::default();
        chain.insert(3, square_of_shares(7));
        let resolver = resolver(chain);

        let err = resolver.resolve(&CallContext::background(), 3).await.unwrap_err();
        assert!(matches!(err, DaError::Consistency(_)));
        assert!(err.to_string().contains("7 shares"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_share_fetch_times_out() {
        let chain = MockChain::default();
        chain.insert(10, square_of_shares(4));
        chain.set_hanging(true);
        let resolver = resolver(chain);
        let ctx = CallContext::background().with_timeout(Duration::from_secs(1));

        let err = resolver.resolve(&ctx, 10).await.unwrap_err();
        assert!(matches!(err, DaError::Timeout { operation: "fetch block shares", .. }));
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_unknown_height_is_not_found() {
        let resolver = resolver(MockChain::default());
        let err = resolver.resolve(&CallContext::background(), 99).await.unwrap_err();
        assert!(matches!(err, DaError::NotFound { da_height: 99, .. }));
    }
}
