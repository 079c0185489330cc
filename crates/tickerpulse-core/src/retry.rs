//! Bounded retry with exponential back-off and jitter.
//!
//! Every network adapter wraps its single call in [`retry_with_backoff`] with
//! an explicit [`RetryPolicy`]. The default policy makes exactly one attempt;
//! retries happen only when an operator configures them.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const MAX_DELAY_MS: u64 = 60_000;

/// Errors that can tell whether another attempt might succeed.
pub trait Retriable {
    fn is_retriable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay before the first retry, doubled for each further retry.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Exactly one attempt.
    pub const NONE: Self = Self {
        max_retries: 0,
        backoff_base_ms: 0,
    };
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// retriable errors.
///
/// | Attempt | Sleep before next attempt       |
/// |---------|---------------------------------|
/// | 1       | base × 2⁰ ± 25 % jitter         |
/// | 2       | base × 2¹ ± 25 % jitter         |
/// | 3       | base × 2² ± 25 % jitter         |
///
/// Delay is capped at 60 s. Non-retriable errors are returned immediately.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Retriable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= policy.max_retries {
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
                    operation = operation_name,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
