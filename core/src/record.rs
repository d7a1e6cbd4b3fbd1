//! The `Record` abstraction shared by every cached collection.
//!
//! A record is a client-side projection of a server row. Each record type
//! names a `Patch` (a partial update where every field is optional) and a
//! canonical sort key that the cache re-establishes after each refresh.

use std::fmt;

/// Server-assigned identifier, unique within one collection.
pub type RecordId = i64;

pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Partial update. A `None` field means "not part of this change", so
    /// `Default` is the empty patch.
    type Patch: Clone + Default + fmt::Debug + Send + Sync + 'static;

    /// Canonical collection order.
    type SortKey: Ord;

    fn id(&self) -> RecordId;

    fn sort_key(&self) -> Self::SortKey;

    /// Shallow update of the fields present in `patch`.
    fn apply(&mut self, patch: &Self::Patch);

    /// Current values of exactly the fields present in `patch`.
    ///
    /// Applying the returned patch after `apply(patch)` restores the record.
    fn pre_image(&self, patch: &Self::Patch) -> Self::Patch;

    /// Human-readable name of the action a patch performs, used in notices
    /// ("cancel appointment", "deactivate schedule slot").
    fn describe(patch: &Self::Patch) -> String;
}

/// Stable sort by the canonical key, keeping the first occurrence of each id.
pub(crate) fn canonicalize<R: Record>(records: Vec<R>) -> Vec<R> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    let mut unique: Vec<R> = records
        .into_iter()
        .filter(|record| seen.insert(record.id()))
        .collect();
    unique.sort_by_key(R::sort_key);
    unique
}
