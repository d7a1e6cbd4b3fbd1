//! HTTP client for the booking API.
//!
//! The API owns every business rule (availability, double-booking, uniqueness);
//! this module only maps its routes to typed calls and its failures to
//! [`ApiError`].

mod client;
mod sources;

pub use client::BookingClient;
pub use sources::{AppointmentsSource, ProfileSource, ScheduleSource, ServicesSource};

use std::time::Duration;
use thiserror::Error;

use crate::retry::{ErrorClass, PermanentError, RetryClassifiable, RetryableError};

/// Errors from API client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session available for an authenticated route.
    #[error("Not logged in")]
    NotAuthenticated,

    /// Network request failed before a response arrived.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API returned a non-2xx response. `message` is the server's `error` text.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API, verbatim.
        message: String,
    },

    /// 2xx response whose body did not match the expected shape.
    #[error("Unexpected response from {route}: {reason}")]
    Decode { route: String, reason: String },

    /// Base URL plus route did not form a valid URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The call did not settle within the configured deadline.
    #[error("Request timed out after {0:?}")]
    TimedOut(Duration),

    /// Header value could not be encoded (e.g. a token with newlines).
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl ApiError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl RetryClassifiable for ApiError {
    fn classify(&self) -> ErrorClass {
        match self {
            ApiError::Network(err) if err.is_timeout() => {
                ErrorClass::Retryable(RetryableError::NetworkTimeout)
            }
            ApiError::Network(err) if err.is_connect() || err.is_request() => {
                ErrorClass::Retryable(RetryableError::ConnectionFailed)
            }
            ApiError::Network(err) => match err.status().map(|s| s.as_u16()) {
                Some(status) => classify_status(status, &err.to_string()),
                None => ErrorClass::Retryable(RetryableError::ConnectionFailed),
            },
            ApiError::Api { status, message } => classify_status(*status, message),
            ApiError::TimedOut(_) => ErrorClass::Retryable(RetryableError::NetworkTimeout),
            ApiError::NotAuthenticated => {
                ErrorClass::Permanent(PermanentError::Unauthorized(self.to_string()))
            }
            ApiError::Decode { reason, .. } => {
                ErrorClass::Permanent(PermanentError::Rejected(reason.clone()))
            }
            ApiError::InvalidUrl(reason) => {
                ErrorClass::Permanent(PermanentError::Rejected(reason.clone()))
            }
            ApiError::InvalidHeader(name) => {
                ErrorClass::Permanent(PermanentError::Rejected(format!("header {name}")))
            }
        }
    }
}

fn classify_status(status: u16, message: &str) -> ErrorClass {
    match status {
        429 => ErrorClass::Retryable(RetryableError::RateLimited),
        502..=504 => ErrorClass::Retryable(RetryableError::ServiceUnavailable(status)),
        401 | 403 => ErrorClass::Permanent(PermanentError::Unauthorized(message.to_string())),
        404 => ErrorClass::Permanent(PermanentError::NotFound(message.to_string())),
        _ => ErrorClass::Permanent(PermanentError::Rejected(message.to_string())),
    }
}

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;
