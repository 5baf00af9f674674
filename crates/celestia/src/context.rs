//! Per-request deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{DaError, Result};

/// Deadline and cancellation signal carried through every network call.
///
/// Dropping the wrapped future aborts the in-flight request.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    timeout: Option<Duration>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context bound to `token` with an optional per-call deadline.
    #[must_use]
    pub fn new(token: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { token, timeout }
    }

    /// Copy of this context with a different deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `fut` until it completes, the deadline passes, or the token fires.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Cancelled`] or [`DaError::Timeout`] if the call did not
    /// finish, otherwise whatever `fut` returned.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(DaError::Cancelled { operation });
        }

        let bounded = async {
            match self.timeout {
                Some(after) => match tokio::time::timeout(after, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(DaError::Timeout { operation, after }),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(DaError::Cancelled { operation }),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let ctx = CallContext::background();
        let value = ctx.run("op", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(50));
        let err = ctx
            .run("slow op", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DaError::Timeout { operation: "slow op", .. }));
    }

    #[tokio::test]
    async fn test_run_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone(), None);

        let handle = tokio::spawn(async move {
            ctx.run("hang", std::future::pending::<Result<()>>()).await
        });
        token.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, DaError::Cancelled { operation: "hang" }));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_call() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new(token, None);
        let err = ctx.run("op", async { Ok(()) }).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
