//! Record stores - durable storage for the student collection.
//!
//! A [`RecordStore`] owns the collection and enforces its one invariant:
//! `reg_number` is unique. Three interchangeable backends are provided and
//! selected once at startup via [`open`]:
//!
//! - [`InMemoryStore`] - insertion-ordered vector, for tests and demos.
//! - [`JsonFileStore`] - a flat JSON file rewritten on every mutation.
//! - [`RemoteStore`] - an HTTP document store, one request per operation.
//!
//! ## Example
//!
//! ```ignore
//! use student_records::{InMemoryStore, RecordStore, StudentRecord};
//!
//! let store = InMemoryStore::new();
//! store.add(StudentRecord::new("Ada", "R1", "CS", "200"))?;
//! assert!(store.add(StudentRecord::new("Bob", "R1", "EE", "100")).is_err());
//! let found = store.search("cs")?;
//! ```

mod in_memory;
mod json_file;
mod remote;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{Backend, StoreConfig};
use crate::student::StudentRecord;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use remote::RemoteStore;

/// Error type for record store operations.
///
/// `Conflict` and `NotFound` are ordinary business outcomes; `Unavailable`
/// means the storage layer itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with this registration number already exists.
    #[error("registration number {reg_number} already exists")]
    Conflict { reg_number: String },

    /// No record with this registration number exists.
    #[error("no student with registration number {reg_number}")]
    NotFound { reg_number: String },

    /// Storage I/O or connectivity failure.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn conflict(reg_number: impl Into<String>) -> Self {
        Self::Conflict {
            reg_number: reg_number.into(),
        }
    }

    pub fn not_found(reg_number: impl Into<String>) -> Self {
        Self::NotFound {
            reg_number: reg_number.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// True for duplicate-key and missing-key outcomes.
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::NotFound { .. })
    }
}

/// Collapse a write result into the success boolean callers usually want,
/// keeping storage failures as errors.
pub fn outcome(result: Result<(), StoreError>) -> Result<bool, StoreError> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.is_business() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Storage for student records keyed on `reg_number`.
pub trait RecordStore: Send + Sync {
    /// All records in storage order.
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError>;

    /// Exact-match lookup by registration number.
    fn get(&self, reg_number: &str) -> Result<Option<StudentRecord>, StoreError>;

    /// Case-insensitive substring search across every field.
    fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError>;

    /// Insert a new record. Fails with `Conflict` if the key is taken.
    fn add(&self, record: StudentRecord) -> Result<(), StoreError>;

    /// Replace every field of an existing record. The stored key is always
    /// `reg_number`, whatever `record.reg_number` says.
    fn update(&self, reg_number: &str, record: StudentRecord) -> Result<(), StoreError>;

    /// Remove a record. Fails with `NotFound` if the key is absent.
    fn delete(&self, reg_number: &str) -> Result<(), StoreError>;

    /// Short backend name for logs and the health route.
    fn backend(&self) -> &'static str;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        (**self).list_all()
    }

    fn get(&self, reg_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        (**self).get(reg_number)
    }

    fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        (**self).search(query)
    }

    fn add(&self, record: StudentRecord) -> Result<(), StoreError> {
        (**self).add(record)
    }

    fn update(&self, reg_number: &str, record: StudentRecord) -> Result<(), StoreError> {
        (**self).update(reg_number, record)
    }

    fn delete(&self, reg_number: &str) -> Result<(), StoreError> {
        (**self).delete(reg_number)
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// Construct the configured backend.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    let store: Arc<dyn RecordStore> = match config.backend {
        Backend::Memory => Arc::new(InMemoryStore::new()),
        Backend::JsonFile => Arc::new(JsonFileStore::open(&config.data_file)?),
        Backend::Remote => Arc::new(RemoteStore::new(&config.remote)?),
    };
    info!(backend = store.backend(), "record store opened");
    Ok(store)
}
