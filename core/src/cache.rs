//! Local entity cache.
//!
//! An ordered, id-unique mirror of one server collection ("this user's
//! appointments", "this barber's weekly schedule"). It is refreshed by full
//! re-fetch and patched in place by the mutation dispatcher. The lock is never
//! held across an `.await`, so readers never observe a half-applied patch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::api::ApiResult;
use crate::error::{BookingError, Result};
use crate::record::{Record, RecordId, canonicalize};

/// Where a cache gets its authoritative contents from.
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    /// Collection name used in notices ("appointments").
    fn collection(&self) -> &'static str;

    async fn fetch_all(&self) -> ApiResult<Vec<R>>;
}

struct CacheState<R> {
    records: Vec<R>,
    /// Ticket of the fetch whose result is currently held.
    applied_ticket: u64,
}

/// Outcome of [`EntityCache::swap_if`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Swap<P> {
    Unknown,
    Refused,
    Applied(P),
}

pub struct EntityCache<R: Record> {
    state: Arc<RwLock<CacheState<R>>>,
    tickets: Arc<AtomicU64>,
    source: Arc<dyn RecordSource<R>>,
}

impl<R: Record> Clone for EntityCache<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            tickets: Arc::clone(&self.tickets),
            source: Arc::clone(&self.source),
        }
    }
}

impl<R: Record> EntityCache<R> {
    /// Empty cache bound to `source`. Call [`EntityCache::load`] to fill it.
    pub fn new(source: Arc<dyn RecordSource<R>>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                records: Vec::new(),
                applied_ticket: 0,
            })),
            tickets: Arc::new(AtomicU64::new(0)),
            source,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.source.collection()
    }

    /// Replace the whole cache with a fresh fetch, in canonical order.
    ///
    /// On failure the previous contents are kept untouched.
    pub async fn load(&self) -> Result<()> {
        self.load_overlaid(Vec::new).await
    }

    /// Like [`EntityCache::load`], then re-apply `overlay()` (the patches of
    /// mutations still in flight) under the same write lock.
    ///
    /// A fetch that started before the one already applied is discarded.
    pub(crate) async fn load_overlaid<O>(&self, overlay: O) -> Result<()>
    where
        O: FnOnce() -> Vec<(RecordId, R::Patch)>,
    {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self
            .source
            .fetch_all()
            .await
            .map_err(|source| BookingError::Fetch {
                collection: self.collection(),
                source,
            })?;
        let mut records = canonicalize(fetched);

        let mut state = self.write();
        if ticket < state.applied_ticket {
            tracing::debug!(
                collection = self.collection(),
                ticket,
                applied = state.applied_ticket,
                "discarding stale fetch"
            );
            return Ok(());
        }
        for (id, patch) in overlay() {
            if let Some(record) = records.iter_mut().find(|r| r.id() == id) {
                record.apply(&patch);
            }
        }
        tracing::debug!(
            collection = self.collection(),
            count = records.len(),
            "cache reloaded"
        );
        state.records = records;
        state.applied_ticket = ticket;
        Ok(())
    }

    /// Shallow update of the record with `id`. Silently ignores unknown ids.
    pub fn patch(&self, id: RecordId, fields: &R::Patch) {
        if let Some(record) = self.write().records.iter_mut().find(|r| r.id() == id) {
            record.apply(fields);
        }
    }

    /// Capture the pre-image of `fields`, let `admit` veto the change, then
    /// apply it, all under one write lock. `admit` runs while the cache lock
    /// is held, so it must not touch the cache.
    pub(crate) fn swap_if<A>(&self, id: RecordId, fields: &R::Patch, admit: A) -> Swap<R::Patch>
    where
        A: FnOnce(&R::Patch) -> bool,
    {
        let mut state = self.write();
        let Some(record) = state.records.iter_mut().find(|r| r.id() == id) else {
            return Swap::Unknown;
        };
        let pre_image = record.pre_image(fields);
        if !admit(&pre_image) {
            return Swap::Refused;
        }
        record.apply(fields);
        Swap::Applied(pre_image)
    }

    /// Remove the record with `id`; returns it when present.
    pub fn remove(&self, id: RecordId) -> Option<R> {
        let mut state = self.write();
        let index = state.records.iter().position(|r| r.id() == id)?;
        Some(state.records.remove(index))
    }

    /// Copy of the current ordered contents.
    pub fn snapshot(&self) -> Vec<R> {
        self.read().records.clone()
    }

    pub fn get(&self, id: RecordId) -> Option<R> {
        self.read().records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.read().records.iter().any(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
