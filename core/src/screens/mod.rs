//! Screen controllers. Each one owns its caches and a cancellation token;
//! closing (or dropping) the screen cancels whatever it still has in flight.
//!
//! Screens never render. They report through the [`Notifier`] in their
//! [`ScreenContext`] and expose plain data for the presentation layer.

mod appointments;
mod profile;
mod schedule;
mod services;
mod wizard;

pub use appointments::AppointmentBook;
pub use profile::{ProfileEditor, ProfileForm, profile_changes};
pub use schedule::{SlotInput, WeeklySchedule, validate_slot};
pub use services::{ServiceCatalog, ServiceInput, validate_service};
pub use wizard::{BookingSelection, BookingWizard, WizardStep};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use barber_async_utils::{Aborted, OrAbortExt};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::api::{ApiError, ApiResult, BookingClient};
use crate::cache::{EntityCache, RecordSource};
use crate::dispatcher::MutationDispatcher;
use crate::error::{BookingError, Result, ValidationError};
use crate::notify::{Notice, Notifier};
use crate::record::Record;
use crate::retry::RetryConfig;
use crate::session::Session;

/// What every screen needs: an authenticated client, somewhere to send
/// notices, and the mutation policy.
#[derive(Clone)]
pub struct ScreenContext {
    pub client: BookingClient,
    pub notifier: Arc<dyn Notifier>,
    /// Deadline for every screen call, optimistic or not.
    pub mutation_timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl ScreenContext {
    pub fn new(client: BookingClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            mutation_timeout: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_mutation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.mutation_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The logged-in session, or a reported `MissingSession`.
    pub(crate) fn session(&self) -> Result<Session> {
        match self.client.session() {
            Some(session) => Ok(session.clone()),
            None => Err(self.reject(ValidationError::MissingSession)),
        }
    }

    pub(crate) fn dispatcher<R: Record>(
        &self,
        source: Arc<dyn RecordSource<R>>,
        lifecycle: &CancellationToken,
    ) -> MutationDispatcher<R> {
        MutationDispatcher::new(EntityCache::new(source), Arc::clone(&self.notifier))
            .with_lifecycle(lifecycle.clone())
            .with_timeout(self.mutation_timeout)
    }

    /// Run a non-optimistic call bound to `lifecycle`. Failures are reported
    /// as "Could not {action}: ..." and returned.
    pub(crate) async fn call<T, Fut>(
        &self,
        lifecycle: &CancellationToken,
        action: &str,
        call: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = ApiResult<T>> + Send,
        T: Send,
    {
        let source = match call.or_abort(lifecycle, self.mutation_timeout).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(source)) => source,
            Err(Aborted::TimedOut(after)) => ApiError::TimedOut(after),
            Err(Aborted::Cancelled) => {
                tracing::debug!(action, "call cancelled by owner");
                return Err(BookingError::Cancelled {
                    action: action.to_string(),
                });
            }
        };
        tracing::warn!(action, "call failed: {source}");
        self.notifier
            .notify(Notice::error(format!("Could not {action}: {source}")));
        Err(BookingError::Api(source))
    }

    pub(crate) fn success(&self, message: impl Into<String>) {
        self.notifier.notify(Notice::success(message));
    }

    /// Report a local rejection and hand it back as an error.
    pub(crate) fn reject(&self, err: ValidationError) -> BookingError {
        self.notifier.notify(Notice::warning(err.to_string()));
        err.into()
    }
}

/// Cancellation scope of one open screen. Dropping it cancels the token.
pub(crate) struct Lifecycle {
    token: CancellationToken,
    _guard: DropGuard,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let token = CancellationToken::new();
        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn close(&self) {
        self.token.cancel();
    }
}
