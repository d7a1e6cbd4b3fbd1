//! Error taxonomy for the booking client.
//!
//! Nothing here is fatal: every variant is recovered locally (cache kept or
//! reverted) and reported to the user through a [`crate::notify::Notifier`].

use thiserror::Error;

use crate::api::ApiError;
use crate::record::RecordId;

/// Result type alias
pub type Result<T> = std::result::Result<T, BookingError>;

#[derive(Debug, Error)]
pub enum BookingError {
    /// A full collection fetch failed; the cache still holds its prior contents.
    #[error("Could not load {collection}: {source}")]
    Fetch {
        collection: &'static str,
        #[source]
        source: ApiError,
    },

    /// A remote mutation failed; the optimistic change was reverted.
    #[error("Could not {action} #{id}: {source}")]
    Mutation {
        action: String,
        id: RecordId,
        #[source]
        source: ApiError,
    },

    /// Rejected locally, before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The owning screen was closed while the call was in flight.
    #[error("Cancelled: {action}")]
    Cancelled { action: String },

    /// Non-cache call (login, registration, booking submission) failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BookingError {
    /// Whether a "try again" affordance makes sense for this error.
    pub fn is_retryable(&self) -> bool {
        use crate::retry::RetryClassifiable;
        match self {
            BookingError::Fetch { .. } => true,
            BookingError::Mutation { source, .. } | BookingError::Api(source) => {
                source.is_retryable()
            }
            BookingError::Validation(_) | BookingError::Cancelled { .. } => false,
        }
    }
}

/// Errors raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("User not found. Please log in again.")]
    MissingSession,

    #[error("Access denied: only barbers can {0}")]
    BarberOnly(&'static str),

    #[error("No record #{0} in this list")]
    UnknownRecord(RecordId),

    #[error("A change to #{0} is already being saved")]
    MutationInFlight(RecordId),

    #[error("Cannot {action} an appointment that is {status}")]
    TransitionNotAllowed {
        action: &'static str,
        status: &'static str,
    },

    #[error("Please complete all required fields: {}", .0.join(", "))]
    IncompleteBooking(Vec<&'static str>),

    #[error("Date {0} is in the past")]
    PastDate(String),

    #[error("No changes were made")]
    NoChanges,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Many(Vec<ValidationError>),
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
