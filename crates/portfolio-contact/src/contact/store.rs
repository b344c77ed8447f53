use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{ContactId, ContactSubmission, StoredContact};

/// Storage abstraction so the submission pipeline can be exercised in isolation.
///
/// Records are append-only: there is no update or delete.
pub trait ContactStore: Send + Sync {
    fn create(&self, submission: ContactSubmission) -> Result<StoredContact, StoreError>;
    fn list(&self) -> Result<Vec<StoredContact>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("contact store unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(value: csv::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
}

/// Process-local store; contents vanish on restart.
#[derive(Default, Clone)]
pub struct InMemoryContactStore {
    records: Arc<Mutex<Vec<StoredContact>>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContactStore for InMemoryContactStore {
    fn create(&self, submission: ContactSubmission) -> Result<StoredContact, StoreError> {
        let mut guard = lock(&self.records)?;
        let id = ContactId(guard.len() as u64 + 1);
        let record = StoredContact::new(id, submission, Utc::now());
        guard.push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<StoredContact>, StoreError> {
        Ok(lock(&self.records)?.clone())
    }
}

/// Append-only CSV file holding one row per contact, in insertion order.
#[derive(Debug)]
pub struct CsvContactStore {
    path: PathBuf,
    next_id: Mutex<u64>,
}

impl CsvContactStore {
    /// Opens the file at `path`, creating it with a header row when missing. The id
    /// sequence resumes after the highest id already on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let exists = path.exists() && fs::metadata(&path)?.len() > 0;
        let last_id = if exists {
            read_records(&path)?
                .iter()
                .map(|record| record.id.0)
                .max()
                .unwrap_or(0)
        } else {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(["id", "name", "email", "subject", "message", "createdAt"])?;
            writer.flush()?;
            0
        };

        Ok(Self {
            path,
            next_id: Mutex::new(last_id + 1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContactStore for CsvContactStore {
    fn create(&self, submission: ContactSubmission) -> Result<StoredContact, StoreError> {
        // Holding the sequence lock for the whole append serializes writers.
        let mut next_id = lock(&self.next_id)?;
        let record = StoredContact::new(ContactId(*next_id), submission, Utc::now());

        let row = encode_row(&record)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        append_row(&mut file, &row)?;

        *next_id += 1;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<StoredContact>, StoreError> {
        let _guard = lock(&self.next_id)?;
        read_records(&self.path)
    }
}

fn read_records(path: &Path) -> Result<Vec<StoredContact>, StoreError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Renders one complete CSV record, without header, for a single append.
pub(super) fn encode_row(record: &StoredContact) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record)?;
    writer
        .into_inner()
        .map_err(|err| StoreError::Unavailable(err.error().to_string()))
}

/// Appends `row` in one write and truncates back to the previous length if it fails,
/// so a torn record never stays in the file.
fn append_row(file: &mut File, row: &[u8]) -> Result<(), StoreError> {
    let committed = file.metadata()?.len();
    let written = file.write_all(row).and_then(|()| file.flush());
    if let Err(err) = written {
        file.set_len(committed)?;
        return Err(err.into());
    }
    Ok(())
}
