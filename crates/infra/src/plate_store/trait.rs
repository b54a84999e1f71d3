use std::sync::Arc;

use thiserror::Error;

use plates_catalog::{
    AuditLogEntry, NewAuditEntry, NewPlate, Plate, PlateFilter, PlateId, PlateOrder,
};
use plates_core::{DomainError, ExpectedVersion};

/// Plate store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// business-rule rejections, which never reach the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The plate changed since it was read; reload and re-evaluate.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("plate {0} not found")]
    NotFound(PlateId),

    #[error("plate {0} already exists")]
    Duplicate(PlateId),

    /// The record was refused by domain validation.
    #[error("invalid plate: {0}")]
    Invalid(DomainError),

    /// A commit whose plate and audit entry disagree.
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable, queryable storage of plates and their audit trail.
///
/// ## Unit of work
///
/// [`commit`](PlateStore::commit) persists the mutated plate and appends its
/// audit entry together: either both become visible or neither does.
///
/// ## Optimistic concurrency
///
/// `commit` compares `expected` against the stored plate version and fails
/// with [`StoreError::Conflict`] on mismatch. Callers retry from a fresh
/// [`find_by_id`](PlateStore::find_by_id).
///
/// ## Queries
///
/// `query` and `count` share the same [`PlateFilter`] semantics. `query`
/// sorts stably, so plates that compare equal keep insertion order.
pub trait PlateStore: Send + Sync {
    /// Returns `Ok(None)` for unknown ids.
    fn find_by_id(&self, id: PlateId) -> Result<Option<Plate>, StoreError>;

    fn query(
        &self,
        filter: &PlateFilter,
        order: PlateOrder,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Plate>, StoreError>;

    fn count(&self, filter: &PlateFilter) -> Result<u64, StoreError>;

    /// Persist a new plate, assigning an id when `plate.id` is `None`.
    fn insert(&self, plate: NewPlate) -> Result<Plate, StoreError>;

    /// Atomically store `plate` and append `entry`.
    ///
    /// Returns the committed audit entry with its assigned id.
    fn commit(
        &self,
        plate: &Plate,
        entry: NewAuditEntry,
        expected: ExpectedVersion,
    ) -> Result<AuditLogEntry, StoreError>;

    /// Audit entries for a plate, newest first.
    fn audit_history(&self, plate_id: PlateId) -> Result<Vec<AuditLogEntry>, StoreError>;
}

impl<S> PlateStore for Arc<S>
where
    S: PlateStore + ?Sized,
{
    fn find_by_id(&self, id: PlateId) -> Result<Option<Plate>, StoreError> {
        (**self).find_by_id(id)
    }

    fn query(
        &self,
        filter: &PlateFilter,
        order: PlateOrder,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Plate>, StoreError> {
        (**self).query(filter, order, skip, take)
    }

    fn count(&self, filter: &PlateFilter) -> Result<u64, StoreError> {
        (**self).count(filter)
    }

    fn insert(&self, plate: NewPlate) -> Result<Plate, StoreError> {
        (**self).insert(plate)
    }

    fn commit(
        &self,
        plate: &Plate,
        entry: NewAuditEntry,
        expected: ExpectedVersion,
    ) -> Result<AuditLogEntry, StoreError> {
        (**self).commit(plate, entry, expected)
    }

    fn audit_history(&self, plate_id: PlateId) -> Result<Vec<AuditLogEntry>, StoreError> {
        (**self).audit_history(plate_id)
    }
}
