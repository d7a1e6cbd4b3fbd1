//! Async utilities for lifecycle-bound futures.
//!
//! Provides the `OrAbortExt` trait, which races a future against the
//! `CancellationToken` of the screen that issued it and, optionally,
//! against a deadline.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a raced future did not produce its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aborted {
    /// The owning token was cancelled (the screen was closed).
    Cancelled,
    /// The deadline elapsed first.
    TimedOut(Duration),
}

impl std::fmt::Display for Aborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aborted::Cancelled => write!(f, "cancelled by owner"),
            Aborted::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

impl std::error::Error for Aborted {}

/// Extension trait for racing futures against cancellation and a deadline.
#[async_trait]
pub trait OrAbortExt: Sized {
    type Output;

    /// Race this future against `token` only.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Aborted>;

    /// Race this future against `token` and, when `deadline` is set, a timer.
    ///
    /// Cancellation wins over the timer when both are ready.
    async fn or_abort(
        self,
        token: &CancellationToken,
        deadline: Option<Duration>,
    ) -> Result<Self::Output, Aborted>;
}

#[async_trait]
impl<F> OrAbortExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Aborted> {
        self.or_abort(token, None).await
    }

    async fn or_abort(
        self,
        token: &CancellationToken,
        deadline: Option<Duration>,
    ) -> Result<Self::Output, Aborted> {
        match deadline {
            Some(after) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Aborted::Cancelled),
                res = tokio::time::timeout(after, self) => res.map_err(|_| Aborted::TimedOut(after)),
            },
            None => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Aborted::Cancelled),
                res = self => Ok(res),
            },
        }
    }
}
