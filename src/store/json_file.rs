//! JsonFileStore - the whole collection in one JSON file.
//!
//! Every mutation loads the full collection, applies the change in memory and
//! rewrites the file. Writes go to a temporary file in the same directory
//! which is then renamed over the data file, so readers never observe a
//! half-written collection.
//!
//! A missing, empty or unparsable file reads as an empty collection and is
//! replaced with `[]` on the next write. A file that is a JSON array is never
//! discarded wholesale: elements that do not decode as records are skipped
//! with a warning and dropped by the next write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use super::{RecordStore, StoreError};
use crate::student::StudentRecord;

/// Flat-file record store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes load-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating the parent directory and an empty
    /// collection file if needed. A corrupt file is reset to `[]`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error("create data directory", &path, e))?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };

        match fs::read(&store.path) {
            Ok(bytes) => {
                if decode(&store.path, &bytes).is_none() {
                    warn!(path = %store.path.display(), "data file is not a record array, resetting");
                    store.save(&[])?;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %store.path.display(), "creating empty data file");
                store.save(&[])?;
            }
            Err(e) => return Err(io_error("read", &store.path, e)),
        }

        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "data file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_error("read", &self.path, e)),
        };

        Ok(decode(&self.path, &bytes).unwrap_or_else(|| {
            warn!(path = %self.path.display(), "data file unparsable, treating as empty");
            Vec::new()
        }))
    }

    fn save(&self, records: &[StudentRecord]) -> Result<(), StoreError> {
        let bytes = to_pretty_json(records)
            .map_err(|e| StoreError::unavailable(format!("encode records: {e}")))?;

        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| io_error("create temp file", &self.path, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| io_error("write", &self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| io_error("replace", &self.path, e.error))?;
        Ok(())
    }

    /// Run a load-modify-write cycle under the write lock.
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<StudentRecord>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let mut records = self.load()?;
        let value = apply(&mut records)?;
        self.save(&records)?;
        Ok(value)
    }
}

/// Decode the data file.
///
/// `None` means the content is not a JSON array at all (bad encoding, bad
/// syntax, wrong top-level type). Inside an array, elements that are not
/// records are skipped so one bad entry never hides the rest.
fn decode(path: &Path, bytes: &[u8]) -> Option<Vec<StudentRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Vec::new());
    }
    let elements: Vec<serde_json::Value> = serde_json::from_slice(bytes).ok()?;
    let total = elements.len();
    let records: Vec<StudentRecord> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(path = %path.display(), index, %err, "skipping malformed record");
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!(
            path = %path.display(),
            kept = records.len(),
            skipped = total - records.len(),
            "data file has malformed records"
        );
    }
    Some(records)
}

fn to_pretty_json(records: &[StudentRecord]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut serializer)?;
    Ok(out)
}

fn io_error(action: &str, path: &Path, err: io::Error) -> StoreError {
    error!(path = %path.display(), %err, "{action} failed");
    StoreError::unavailable(format!("{action} {}: {err}", path.display()))
}

impl RecordStore for JsonFileStore {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.load()
    }

    fn get(&self, reg_number: &str) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|r| r.reg_number == reg_number))
    }

    fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let found: Vec<StudentRecord> = self
            .load()?
            .into_iter()
            .filter(|r| r.matches(query))
            .collect();
        debug!(query, hits = found.len(), "search");
        Ok(found)
    }

    fn add(&self, record: StudentRecord) -> Result<(), StoreError> {
        let reg_number = record.reg_number.clone();
        self.mutate(|records| {
            if records.iter().any(|r| r.reg_number == record.reg_number) {
                warn!(reg_number = %record.reg_number, "duplicate registration number");
                return Err(StoreError::conflict(record.reg_number));
            }
            records.push(record);
            Ok(())
        })?;
        info!(%reg_number, "student added");
        Ok(())
    }

    fn update(&self, reg_number: &str, record: StudentRecord) -> Result<(), StoreError> {
        self.mutate(|records| {
            let slot = records
                .iter_mut()
                .find(|r| r.reg_number == reg_number)
                .ok_or_else(|| StoreError::not_found(reg_number))?;
            *slot = record.rekeyed(reg_number);
            Ok(())
        })?;
        info!(reg_number, "student updated");
        Ok(())
    }

    fn delete(&self, reg_number: &str) -> Result<(), StoreError> {
        self.mutate(|records| {
            let before = records.len();
            records.retain(|r| r.reg_number != reg_number);
            if records.len() == before {
                return Err(StoreError::not_found(reg_number));
            }
            Ok(())
        })?;
        info!(reg_number, "student deleted");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "json_file"
    }
}
