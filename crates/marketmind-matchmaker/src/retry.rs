//! Retry with exponential back-off and jitter for model clients.
//!
//! [`RetryingClient`] wraps any [`ModelClient`] and retries on transient
//! errors (timeouts, connection failures, 429, 5xx). Safety blocks, empty
//! responses and malformed envelopes are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ModelError;
use crate::model::{invoke_with_deadline, ModelClient, ModelOutput, ModelRequest};

const MAX_DELAY_MS: u64 = 60_000;

/// Upper bound on the back-off before retry `attempt` (1-based), before jitter.
fn capped_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << attempt.saturating_sub(1).min(10))
        .min(MAX_DELAY_MS)
}

/// Worst-case wall time for one call through a [`RetryingClient`].
///
/// Covers `max_retries + 1` attempts of `attempt_timeout` each plus the
/// largest jittered back-off before every retry. Stage deadlines sized with
/// this never cut off an attempt the retry policy would still make.
#[must_use]
pub fn retry_budget(
    attempt_timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Duration {
    let backoff_ms: u64 = (1..=max_retries)
        .map(|attempt| {
            let capped = capped_delay_ms(backoff_base_ms, attempt);
            capped.saturating_add(capped / 4)
        })
        .fold(0, u64::saturating_add);
    attempt_timeout
        .saturating_mul(max_retries.saturating_add(1))
        .saturating_add(Duration::from_millis(backoff_ms))
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// With `backoff_base_ms = 1_000` the sleep before retry `n` is
/// `1 000 ms × 2ⁿ⁻¹ ± 25 %`, capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = capped_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient model error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Decorator adding bounded retries to a [`ModelClient`].
///
/// `max_retries = 0` calls the inner client exactly once. With an attempt
/// timeout set, each attempt is bounded on its own and an elapsed attempt
/// counts as a transient failure.
#[derive(Debug)]
pub struct RetryingClient<M> {
    inner: M,
    max_retries: u32,
    backoff_base_ms: u64,
    attempt_timeout: Option<Duration>,
}

impl<M: ModelClient> RetryingClient<M> {
    #[must_use]
    pub fn new(inner: M, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_base_ms,
            attempt_timeout: None,
        }
    }

    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Worst-case duration of one [`ModelClient::invoke`] call, if attempts are bounded.
    #[must_use]
    pub fn budget(&self) -> Option<Duration> {
        self.attempt_timeout
            .map(|timeout| retry_budget(timeout, self.max_retries, self.backoff_base_ms))
    }

    #[must_use]
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: ModelClient> ModelClient for RetryingClient<M> {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            match self.attempt_timeout {
                Some(timeout) => invoke_with_deadline(&self.inner, request, timeout).await,
                None => self.inner.invoke(request).await,
            }
        })
        .await
    }
}
