//! Bounded retry-with-backoff wrapper for external completion calls.
//!
//! Retries are local to a stage: the wrapper re-runs only the closure
//! it was given, never an earlier stage.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::StageError;

/// Per-stage retry budget. Default: one retry with 500ms backoff,
/// doubling per attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Runs `op` up to `1 + max_retries` times, backing off between
/// attempts. Non-retryable errors short-circuit; the last error is
/// returned once the budget is exhausted.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    stage: &str,
    op: F,
) -> Result<T, StageError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StageError>>,
{
    let mut last_error: Option<StageError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.pow(attempt - 1);
            warn!(
                stage,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after failed completion call"
            );
            tokio::time::sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_error.expect("at least one attempt was made"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::llm_client::LlmError;

    fn transport() -> StageError {
        StageError::Transport(LlmError::Api {
            status: 529,
            message: "overloaded".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_try_without_backoff() {
        let policy = RetryPolicy::default();
        let result: Result<u32, _> = call_with_retry(&policy, "test", || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failure_then_succeeds() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        let attempts = AtomicU32::new(0);

        let result = call_with_retry(&policy, "test", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transport())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_last_error() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = call_with_retry(&policy, "test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(transport())
        })
        .await;

        assert!(matches!(result, Err(StageError::Transport(_))));
        // Default budget: initial attempt plus one retry.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_short_circuits() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = call_with_retry(&policy, "test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(StageError::Validation("out of range".into()))
        })
        .await;

        assert!(matches!(result, Err(StageError::Validation(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
