//! Retry logic with exponential backoff
//!
//! Retrying is a decorator around a remote call, never built into the
//! mutation dispatcher. This module provides:
//! - Error classification (retryable vs permanent)
//! - Exponential backoff with jitter (via `backon`)
//! - A wrapper that turns any remote-call factory into a retrying one

pub mod classifier;
pub mod strategy;

pub use classifier::{ErrorClass, PermanentError, RetryClassifiable, RetryableError};
pub use strategy::{RetryConfig, execute_with_backoff, retrying};
