//! Backoff strategy implementations
//!
//! Exponential backoff with jitter on top of `backon`. Only errors classified
//! as retryable are retried; a permanent error is returned as-is so the
//! server's message reaches the user unchanged, and an exhausted retry budget
//! returns the last error seen.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::classifier::RetryClassifiable;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (3 → at most 4 calls).
    pub max_attempts: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f32,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_backoff_ms))
            .with_max_delay(Duration::from_millis(self.max_backoff_ms))
            .with_factor(self.backoff_multiplier)
            .with_max_times(self.max_attempts);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Execute operation with exponential backoff retry.
pub async fn execute_with_backoff<F, Fut, T, E>(operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryClassifiable + Display,
{
    operation
        .retry(config.backoff())
        .when(|err: &E| err.is_retryable())
        .notify(|err: &E, sleep: Duration| {
            tracing::warn!("Transient error: {err}, retrying in {sleep:?}");
        })
        .await
}

/// Wrap a remote-call factory so that every invocation retries transient
/// failures. The result is itself a one-shot remote call and can be handed to
/// the mutation dispatcher like any other.
pub fn retrying<F, Fut, T, E>(
    config: RetryConfig,
    operation: F,
) -> impl FnOnce() -> BoxFuture<'static, Result<T, E>> + Send
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: RetryClassifiable + Display + Send + 'static,
{
    move || Box::pin(async move { execute_with_backoff(operation, &config).await })
}
