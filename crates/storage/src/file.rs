//! FileStore: MemoryStore persisted to a single JSON file
//!
//! The whole store (records and migration ledger) is serialized as one JSON
//! document. Writes go to a sibling temp file which is then renamed over the
//! target, so a crash leaves either the old or the new file, never a torn one.
//!
//! Two sync modes:
//! - `SyncMode::EveryWrite` persists after each mutation
//! - `SyncMode::Deferred` persists only on `flush()`, for bulk jobs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fedstore_core::{AppliedMigration, Error, MigrationLedger, Record, RecordStore, Result};

use crate::memory::MemoryStore;

/// When a FileStore writes its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Persist after every mutation
    #[default]
    EveryWrite,
    /// Persist only when `flush()` is called
    Deferred,
}

/// On-disk document
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    migrations: Vec<AppliedMigration>,
}

/// Record store backed by a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    mode: SyncMode,
    dirty: AtomicBool,
    /// Serializes file writes
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create on first write) the store at `path`, syncing every write
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the file exists but cannot be parsed, or `Io`
    /// if it cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SyncMode::EveryWrite)
    }

    /// Open with an explicit sync mode
    pub fn open_with(path: impl AsRef<Path>, mode: SyncMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<StoreFile>(&content).map_err(|e| {
                Error::Corruption(format!(
                    "Failed to parse store file '{}': {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            StoreFile::default()
        };

        info!(
            target: "fedstore::store",
            path = %path.display(),
            records = doc.records.len(),
            "Opened file store"
        );

        Ok(Self {
            path,
            inner: MemoryStore::from_parts(doc.records, doc.migrations),
            mode,
            dirty: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Write the current state to disk if anything changed
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` if the file cannot be written.
    pub fn flush(&self) -> Result<()> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    fn after_mutation(&self) -> Result<()> {
        self.dirty.store(true, Ordering::SeqCst);
        match self.mode {
            SyncMode::EveryWrite => self.flush(),
            SyncMode::Deferred => Ok(()),
        }
    }

    fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let doc = StoreFile {
            records: self.inner.records(),
            migrations: self.inner.ledger_entries(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(
            target: "fedstore::store",
            path = %self.path.display(),
            records = doc.records.len(),
            "Persisted file store"
        );
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(
                target: "fedstore::store",
                path = %self.path.display(),
                error = %e,
                "Failed to flush file store on drop"
            );
        }
    }
}

impl RecordStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Record>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<u64> {
        let version = self.inner.put(key, value)?;
        self.after_mutation()?;
        Ok(version)
    }

    fn delete(&self, key: &str) -> Result<Option<Record>> {
        let removed = self.inner.delete(key)?;
        if removed.is_some() {
            self.after_mutation()?;
        }
        Ok(removed)
    }

    fn list_keys_after(&self, after: Option<&str>, limit: usize) -> Result<Vec<String>> {
        self.inner.list_keys_after(after, limit)
    }

    fn set_namespace(&self, key: &str, namespace: Option<String>) -> Result<()> {
        self.inner.set_namespace(key, namespace)?;
        self.after_mutation()
    }

    fn scan_namespace(&self, namespace: &str) -> Result<Vec<Record>> {
        self.inner.scan_namespace(namespace)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl MigrationLedger for FileStore {
    fn applied(&self) -> Result<Vec<AppliedMigration>> {
        self.inner.applied()
    }

    fn record_applied(&self, entry: AppliedMigration) -> Result<()> {
        self.inner.record_applied(entry)?;
        self.after_mutation()
    }

    fn remove_applied(&self, id: &str) -> Result<bool> {
        let removed = self.inner.remove_applied(id)?;
        if removed {
            self.after_mutation()?;
        }
        Ok(removed)
    }
}
