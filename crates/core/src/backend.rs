//! The `CorrectionBackend` trait: keyed storage for correction records.
//!
//! Implemented by `tagwise-storage` (SQLite and in-memory). The store in
//! `tagwise-learn` depends on this abstraction only.

use std::future::Future;

use crate::correction::{Correction, CorrectionId, PatternKey};

/// Durable keyed storage with point lookups and filtered scans.
///
/// Writes are compare-and-swap on [`Correction::revision`]: a write that
/// loses a race returns `Ok(false)` instead of overwriting, and the caller
/// re-reads and retries.
pub trait CorrectionBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(
        &self,
        id: CorrectionId,
    ) -> impl Future<Output = Result<Option<Correction>, Self::Error>> + Send + '_;

    /// Lookup by the `(pattern, match_type)` dedup key.
    fn find<'a>(
        &'a self,
        key: &'a PatternKey,
    ) -> impl Future<Output = Result<Option<Correction>, Self::Error>> + Send + 'a;

    /// Every record with `confidence >= min_confidence`, ordered by
    /// `created_at` then `id`.
    fn scan(
        &self,
        min_confidence: f64,
    ) -> impl Future<Output = Result<Vec<Correction>, Self::Error>> + Send + '_;

    /// Insert a new record. Returns `false` if its pattern key is taken.
    fn insert<'a>(
        &'a self,
        correction: &'a Correction,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

    /// Overwrite the record with `correction.id` if its stored revision is
    /// still `expected_revision`. Returns `false` otherwise.
    fn replace<'a>(
        &'a self,
        correction: &'a Correction,
        expected_revision: u64,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

    /// Remove a record, optionally only at `expected_revision`. Returns
    /// `false` if nothing was removed.
    fn remove(
        &self,
        id: CorrectionId,
        expected_revision: Option<u64>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
