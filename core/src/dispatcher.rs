//! Mutation dispatcher.
//!
//! Applies a change to the local cache before the network round-trip, then
//! either resyncs from the server (success) or restores the pre-image
//! (failure). At most one mutation per record id is in flight at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use barber_async_utils::{Aborted, OrAbortExt};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiResult};
use crate::cache::{EntityCache, Swap};
use crate::error::{BookingError, Result, ValidationError};
use crate::notify::{Notice, Notifier};
use crate::record::{Record, RecordId};

/// A change whose remote call has not settled yet.
struct PendingMutation<R: Record> {
    fields: R::Patch,
    pre_image: R::Patch,
}

type PendingMap<R> = Arc<Mutex<HashMap<RecordId, PendingMutation<R>>>>;

pub struct MutationDispatcher<R: Record> {
    cache: EntityCache<R>,
    pending: PendingMap<R>,
    notifier: Arc<dyn Notifier>,
    lifecycle: CancellationToken,
    timeout: Option<Duration>,
}

impl<R: Record> Clone for MutationDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            pending: Arc::clone(&self.pending),
            notifier: Arc::clone(&self.notifier),
            lifecycle: self.lifecycle.clone(),
            timeout: self.timeout,
        }
    }
}

impl<R: Record> MutationDispatcher<R> {
    pub fn new(cache: EntityCache<R>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            pending: Arc::new(Mutex::new(HashMap::new())),
            notifier,
            lifecycle: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Bind in-flight calls to the owning screen's token.
    pub fn with_lifecycle(mut self, token: CancellationToken) -> Self {
        self.lifecycle = token;
        self
    }

    /// Treat a remote call that has not settled after `timeout` as failed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &EntityCache<R> {
        &self.cache
    }

    pub fn lifecycle(&self) -> &CancellationToken {
        &self.lifecycle
    }

    /// Whether a mutation of `id` is waiting on the server.
    pub fn is_pending(&self, id: RecordId) -> bool {
        self.lock_pending().contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Cancel every in-flight call. The cache is left as it is.
    pub fn close(&self) {
        self.lifecycle.cancel();
    }

    /// Full reload that keeps in-flight patches visible. Failures are
    /// reported to the notifier and returned.
    pub async fn refresh(&self) -> Result<()> {
        let reload = match self.resync().or_cancel(&self.lifecycle).await {
            Ok(reload) => reload,
            Err(_) => {
                tracing::debug!(collection = self.cache.collection(), "refresh cancelled");
                return Ok(());
            }
        };
        reload.inspect_err(|err| self.report(err))
    }

    /// Optimistically apply `fields` to record `id`, then run `remote_call`.
    ///
    /// On success the cache is resynced from the server and the call's value
    /// is returned. On failure (including timeout) the fields are restored to
    /// their pre-image and an error notice naming the action is emitted.
    /// Rejections (unknown id, same id already in flight) happen before any
    /// cache change or network call.
    pub async fn dispatch<F, Fut, T>(
        &self,
        id: RecordId,
        fields: R::Patch,
        remote_call: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>> + Send,
        T: Send,
    {
        let action = R::describe(&fields);
        if self.lifecycle.is_cancelled() {
            return Err(BookingError::Cancelled {
                action: format!("{action} #{id}"),
            });
        }

        let guard = self.begin(id, &fields).inspect_err(|err| self.report(err))?;
        tracing::debug!(collection = self.cache.collection(), id, %action, "optimistic patch applied");

        match remote_call().or_abort(&self.lifecycle, self.timeout).await {
            Ok(Ok(value)) => {
                drop(guard);
                tracing::info!(collection = self.cache.collection(), id, %action, "mutation confirmed");
                self.resync_after(&action, id).await;
                Ok(value)
            }
            Ok(Err(source)) => Err(self.revert(guard, action, source)),
            Err(Aborted::TimedOut(after)) => {
                Err(self.revert(guard, action, ApiError::TimedOut(after)))
            }
            Err(Aborted::Cancelled) => {
                tracing::debug!(id, %action, "mutation cancelled by owner; cache left as is");
                Err(BookingError::Cancelled {
                    action: format!("{action} #{id}"),
                })
            }
        }
    }

    /// Delete record `id` on the server through `remote_call`.
    ///
    /// The id counts as in flight for the whole call, so edits and a second
    /// delete of the same record are rejected until it settles. The record
    /// leaves the cache only once the server confirms; a failure leaves it in
    /// place and is reported like any failed mutation.
    pub async fn delete<F, Fut>(&self, id: RecordId, action: &str, remote_call: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<()>> + Send,
    {
        if self.lifecycle.is_cancelled() {
            return Err(BookingError::Cancelled {
                action: format!("{action} #{id}"),
            });
        }

        let guard = self
            .begin(id, &R::Patch::default())
            .inspect_err(|err| self.report(err))?;

        match remote_call().or_abort(&self.lifecycle, self.timeout).await {
            Ok(Ok(())) => {
                self.cache.remove(id);
                drop(guard);
                tracing::info!(collection = self.cache.collection(), id, action, "delete confirmed");
                self.resync_after(action, id).await;
                Ok(())
            }
            Ok(Err(source)) => Err(self.revert(guard, action.to_string(), source)),
            Err(Aborted::TimedOut(after)) => {
                Err(self.revert(guard, action.to_string(), ApiError::TimedOut(after)))
            }
            Err(Aborted::Cancelled) => {
                tracing::debug!(id, action, "delete cancelled by owner");
                Err(BookingError::Cancelled {
                    action: format!("{action} #{id}"),
                })
            }
        }
    }

    /// Reload after a write the server already accepted. A failed reload is
    /// reported as its own notice; the write still counts as done.
    pub async fn refresh_after_write(&self, action: &str) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(collection = self.cache.collection(), "refresh after {action} failed: {err}");
        }
    }

    /// Lock order is always cache, then pending map.
    fn begin(&self, id: RecordId, fields: &R::Patch) -> Result<PendingGuard<R>> {
        let swap = self.cache.swap_if(id, fields, |pre_image| {
            let mut pending = self.lock_pending();
            if pending.contains_key(&id) {
                return false;
            }
            pending.insert(
                id,
                PendingMutation {
                    fields: fields.clone(),
                    pre_image: pre_image.clone(),
                },
            );
            true
        });
        match swap {
            Swap::Applied(_) => Ok(PendingGuard {
                pending: Arc::clone(&self.pending),
                id,
            }),
            Swap::Refused => Err(ValidationError::MutationInFlight(id).into()),
            Swap::Unknown => Err(ValidationError::UnknownRecord(id).into()),
        }
    }

    fn revert(&self, guard: PendingGuard<R>, action: String, source: ApiError) -> BookingError {
        let id = guard.id;
        if let Some(pending) = guard.settle() {
            self.cache.patch(id, &pending.pre_image);
        }
        tracing::warn!(collection = self.cache.collection(), id, %action, "reverted: {source}");
        let err = BookingError::Mutation { action, id, source };
        self.report(&err);
        err
    }

    /// Resync once a mutation is confirmed, unless the owner has gone away.
    async fn resync_after(&self, action: &str, id: RecordId) {
        match self.resync().or_cancel(&self.lifecycle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!("resync after {action} #{id} failed: {err}");
                self.report(&err);
            }
            Err(_) => tracing::debug!(id, action, "resync skipped; owner closed"),
        }
    }

    async fn resync(&self) -> Result<()> {
        let pending = Arc::clone(&self.pending);
        self.cache
            .load_overlaid(move || {
                pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .map(|(id, mutation)| (*id, mutation.fields.clone()))
                    .collect()
            })
            .await
    }

    fn report(&self, err: &BookingError) {
        let notice = match err {
            BookingError::Cancelled { .. } => return,
            BookingError::Validation(_) => Notice::warning(err.to_string()),
            _ => Notice::error(err.to_string()),
        };
        self.notifier.notify(notice);
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<RecordId, PendingMutation<R>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the pending entry when the dispatch settles or its future is
/// dropped mid-flight.
struct PendingGuard<R: Record> {
    pending: PendingMap<R>,
    id: RecordId,
}

impl<R: Record> PendingGuard<R> {
    fn settle(self) -> Option<PendingMutation<R>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id)
    }
}

impl<R: Record> Drop for PendingGuard<R> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
