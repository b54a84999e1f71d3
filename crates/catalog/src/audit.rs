//! Append-only audit trail of plate lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plate::{PlateEvent, PlateId, PlateStatus};

/// Surrogate key of an audit entry, assigned by the store in commit order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEntryId(pub u64);

impl core::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What happened to the plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Reserved,
    Sold,
    Unreserved,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Reserved => "Reserved",
            AuditAction::Sold => "Sold",
            AuditAction::Unreserved => "Unreserved",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit entry ready to be committed (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub plate_id: PlateId,
    pub action: AuditAction,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
    pub status_after: PlateStatus,
}

impl NewAuditEntry {
    /// Assign the store-issued id.
    pub fn into_entry(self, id: AuditEntryId) -> AuditLogEntry {
        AuditLogEntry {
            id,
            plate_id: self.plate_id,
            action: self.action,
            performed_by: self.performed_by,
            performed_at: self.performed_at,
            status_after: self.status_after,
        }
    }
}

impl From<&PlateEvent> for NewAuditEntry {
    fn from(event: &PlateEvent) -> Self {
        let (action, performed_at) = match event {
            PlateEvent::PlateReserved(e) => (AuditAction::Reserved, e.reserved_at),
            PlateEvent::PlateSold(e) => (AuditAction::Sold, e.sold_at),
            PlateEvent::PlateUnreserved(e) => (AuditAction::Unreserved, e.unreserved_at),
        };

        Self {
            plate_id: event.plate_id(),
            action,
            performed_by: event.actor().to_string(),
            performed_at,
            status_after: event.resulting_status(),
        }
    }
}

/// A committed, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub plate_id: PlateId,
    pub action: AuditAction,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
    pub status_after: PlateStatus,
}

impl AuditLogEntry {
    /// Newest first: `performed_at` descending, later commits first on ties.
    pub fn newest_first(a: &Self, b: &Self) -> core::cmp::Ordering {
        b.performed_at
            .cmp(&a.performed_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}
