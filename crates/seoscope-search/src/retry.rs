//! Retry with exponential back-off and jitter around a whole backend-chain
//! query.
//!
//! The chain itself never retries a tier; it falls through to the next one.
//! Only when every tier failed and at least one of them failed transiently
//! is the full chain re-run after a delay.

use std::future::Future;
use std::time::Duration;

use seoscope_core::AppConfig;

use crate::error::SearchError;

/// Back-off settings for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

/// Returns `true` when re-running the chain could plausibly succeed.
///
/// Invalid queries and chains where every tier failed permanently (not
/// configured, malformed payload, empty, 4xx) are hard stops.
pub(crate) fn is_retriable(err: &SearchError) -> bool {
    match err {
        SearchError::AllBackendsExhausted { attempts, .. } => {
            attempts.iter().any(|a| a.reason.is_transient())
        }
        SearchError::BackendUnavailable { reason, .. } => reason.is_transient(),
        SearchError::Client(_) | SearchError::InvalidQuery(_) => false,
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// retriable errors. Delay doubles per attempt from `backoff_base_ms`, is
/// capped at 60 s, and is scaled by a random factor in `[0.75, 1.25)`.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "search chain failed transiently; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
