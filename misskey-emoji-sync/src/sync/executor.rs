use std::future::Future;

use misskey_core::MisskeyError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("api error: {0}")]
    Remote(#[from] MisskeyError),
    #[error("{operation}: still rate limited after {attempts} attempts")]
    RateLimitExhausted { operation: String, attempts: u32 },
    #[error("{operation}: cancelled")]
    Cancelled { operation: String },
}

impl ExecuteError {
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, ExecuteError::Remote(err) if err.is_duplicate_name())
    }
}

/// Runs a single remote request, sleeping and re-issuing it while the server
/// answers with a rate-limit error. Every other error is returned as is.
#[derive(Debug, Clone, Default)]
pub struct RequestExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RequestExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        mut request: F,
    ) -> Result<T, ExecuteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MisskeyError>>,
    {
        let mut retries = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(ExecuteError::Cancelled {
                    operation: operation.to_string(),
                });
            }

            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => err,
                Err(err) => return Err(err.into()),
            };

            let Some(delay) = self.policy.delay(retries) else {
                tracing::error!(
                    operation,
                    attempts = retries + 1,
                    error = %err,
                    "giving up on rate limit"
                );
                return Err(ExecuteError::RateLimitExhausted {
                    operation: operation.to_string(),
                    attempts: retries + 1,
                });
            };
            retries += 1;
            tracing::warn!(
                operation,
                wait_secs = delay.as_secs_f64(),
                "rate limit exceeded, waiting before retry"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ExecuteError::Cancelled {
                        operation: operation.to_string(),
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
