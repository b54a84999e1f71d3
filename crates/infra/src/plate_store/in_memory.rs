use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use plates_catalog::{
    AuditEntryId, AuditLogEntry, NewAuditEntry, NewPlate, Plate, PlateFilter, PlateId, PlateOrder,
};
use plates_core::{AggregateRoot, ExpectedVersion};

use super::r#trait::{PlateStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order is the natural storage order.
    plates: Vec<Plate>,
    index: HashMap<PlateId, usize>,
    audit: Vec<AuditLogEntry>,
    last_audit_id: u64,
}

/// In-memory plate store.
///
/// Intended for tests/dev. A single lock guards plates and audit entries, so a
/// commit is trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryPlateStore {
    tables: RwLock<Tables>,
}

impl InMemoryPlateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl PlateStore for InMemoryPlateStore {
    fn find_by_id(&self, id: PlateId) -> Result<Option<Plate>, StoreError> {
        let tables = self.read()?;
        Ok(tables.index.get(&id).map(|&i| tables.plates[i].clone()))
    }

    fn query(
        &self,
        filter: &PlateFilter,
        order: PlateOrder,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Plate>, StoreError> {
        let tables = self.read()?;

        let mut matching: Vec<&Plate> =
            tables.plates.iter().filter(|p| filter.matches(p)).collect();
        // `sort_by` is stable: ties keep insertion order.
        matching.sort_by(|a, b| order.compare(a, b));

        Ok(matching.into_iter().skip(skip).take(take).cloned().collect())
    }

    fn count(&self, filter: &PlateFilter) -> Result<u64, StoreError> {
        let tables = self.read()?;
        Ok(tables.plates.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    fn insert(&self, plate: NewPlate) -> Result<Plate, StoreError> {
        let id = plate.id.unwrap_or_else(PlateId::generate);
        let plate = Plate::create(id, plate).map_err(StoreError::Invalid)?;

        let mut tables = self.write()?;
        if tables.index.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }

        let position = tables.plates.len();
        tables.plates.push(plate.clone());
        tables.index.insert(id, position);

        Ok(plate)
    }

    fn commit(
        &self,
        plate: &Plate,
        entry: NewAuditEntry,
        expected: ExpectedVersion,
    ) -> Result<AuditLogEntry, StoreError> {
        let id = plate.id_typed();
        if entry.plate_id != id {
            return Err(StoreError::InvalidCommit(format!(
                "audit entry targets plate {} but plate {id} was committed",
                entry.plate_id
            )));
        }

        let mut tables = self.write()?;
        let position = *tables.index.get(&id).ok_or(StoreError::NotFound(id))?;

        let current = tables.plates[position].version();
        expected
            .check(current)
            .map_err(|err| StoreError::Conflict(format!("plate {id}: {err}")))?;
        if plate.version() <= current {
            return Err(StoreError::InvalidCommit(format!(
                "plate {id}: version {} does not advance stored version {current}",
                plate.version()
            )));
        }

        // Both writes happen under the same guard; no reader sees one without the other.
        tables.last_audit_id += 1;
        let committed = entry.into_entry(AuditEntryId(tables.last_audit_id));
        tables.plates[position] = plate.clone();
        tables.audit.push(committed.clone());

        Ok(committed)
    }

    fn audit_history(&self, plate_id: PlateId) -> Result<Vec<AuditLogEntry>, StoreError> {
        let tables = self.read()?;
        let mut entries: Vec<AuditLogEntry> = tables
            .audit
            .iter()
            .filter(|e| e.plate_id == plate_id)
            .cloned()
            .collect();
        entries.sort_by(AuditLogEntry::newest_first);
        Ok(entries)
    }
}
