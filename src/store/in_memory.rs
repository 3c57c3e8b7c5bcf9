//! InMemoryStore - vector-backed record store for testing and development.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use super::{RecordStore, StoreError};
use crate::student::StudentRecord;

/// In-memory record store.
///
/// Records keep their insertion order. Clone-friendly via Arc: clones share
/// the same collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<StudentRecord>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    ///
    /// Later duplicates of an earlier key are dropped.
    pub fn with_records(records: impl IntoIterator<Item = StudentRecord>) -> Self {
        let mut unique: Vec<StudentRecord> = Vec::new();
        for record in records {
            if !unique.iter().any(|r| r.reg_number == record.reg_number) {
                unique.push(record);
            }
        }
        Self {
            records: Arc::new(RwLock::new(unique)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StudentRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StudentRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))
    }
}

impl RecordStore for InMemoryStore {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.read()?.clone())
    }

    fn get(&self, reg_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        let records = self.read()?;
        Ok(records.iter().find(|r| r.reg_number == reg_number).cloned())
    }

    fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let records = self.read()?;
        let found: Vec<StudentRecord> = records
            .iter()
            .filter(|r| r.matches(query))
            .cloned()
            .collect();
        debug!(query, hits = found.len(), "search");
        Ok(found)
    }

    fn add(&self, record: StudentRecord) -> Result<(), StoreError> {
        let mut records = self.write()?;
        if records.iter().any(|r| r.reg_number == record.reg_number) {
            warn!(reg_number = %record.reg_number, "duplicate registration number");
            return Err(StoreError::conflict(record.reg_number));
        }
        info!(reg_number = %record.reg_number, "student added");
        records.push(record);
        Ok(())
    }

    fn update(&self, reg_number: &str, record: StudentRecord) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let slot = records
            .iter_mut()
            .find(|r| r.reg_number == reg_number)
            .ok_or_else(|| StoreError::not_found(reg_number))?;
        *slot = record.rekeyed(reg_number);
        info!(reg_number, "student updated");
        Ok(())
    }

    fn delete(&self, reg_number: &str) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let index = records
            .iter()
            .position(|r| r.reg_number == reg_number)
            .ok_or_else(|| StoreError::not_found(reg_number))?;
        records.remove(index);
        info!(reg_number, "student deleted");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
