//! Bounded retry with a fresh navigator session per attempt.
//!
//! Every navigation-dependent operation in the traversal runs through
//! [`SessionExecutor::run`]: acquire a session, run the operation, close
//! the session, and on a transient failure sleep and start over with a
//! new session. The session is closed on every exit path before any
//! retry sleep; `close` never produces an error that could mask the
//! operation outcome.

use crate::error::ScrapeError;
use crate::navigator::{NavigatorFactory, PageNavigator};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Fixed-delay, bounded-attempt retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Whether a failure is worth another attempt.
    pub fn is_transient(&self, err: &ScrapeError) -> bool {
        err.is_transient()
    }
}

/// Runs session-dependent operations under a [`RetryPolicy`].
pub struct SessionExecutor<F: NavigatorFactory> {
    factory: F,
    policy: RetryPolicy,
}

impl<F: NavigatorFactory> SessionExecutor<F> {
    pub fn new(factory: F, policy: RetryPolicy) -> Self {
        Self { factory, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes `op` against a freshly acquired session, retrying
    /// transient failures up to the policy's attempt bound.
    ///
    /// `url` identifies the operation in failure logs.
    pub async fn run<T, Op>(&self, url: &str, op: Op) -> Result<T, ScrapeError>
    where
        T: Send,
        Op: Fn(Arc<F::Navigator>) -> BoxFuture<'static, Result<T, ScrapeError>> + Send + Sync,
    {
        let mut attempt = 1u32;
        loop {
            let outcome = self.attempt(&op).await;
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if self.policy.is_transient(&err) && attempt < self.policy.max_attempts => {
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        %err,
                        "transient failure, retrying after delay"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(err) => {
                    error!(url, attempt, %err, "operation failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T, Op>(&self, op: &Op) -> Result<T, ScrapeError>
    where
        T: Send,
        Op: Fn(Arc<F::Navigator>) -> BoxFuture<'static, Result<T, ScrapeError>> + Send + Sync,
    {
        let navigator = self.factory.acquire().await?;
        let result = op(Arc::clone(&navigator)).await;
        // Success, transient or fatal: the session is released either way.
        navigator.close().await;
        result
    }
}
