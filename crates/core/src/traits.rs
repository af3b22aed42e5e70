//! Core traits for store abstraction
//!
//! This module defines the [`RecordStore`] and [`MigrationLedger`] traits that
//! let migrations run against any backend without knowing how it persists.
//!
//! Thread safety: all methods must be safe to call concurrently from multiple
//! threads (requires Send + Sync). Migrations fan per-record updates out
//! across a thread pool.

use crate::error::Result;
use crate::record::{AppliedMigration, Record};

/// Page size used by [`RecordStore::list_all_keys`]
const LIST_ALL_PAGE: usize = 1024;

/// Key-value record store
pub trait RecordStore: Send + Sync {
    /// Get the record stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &str) -> Result<Option<Record>>;

    /// Create or overwrite the value under `key`
    ///
    /// An existing record keeps its namespace. Returns the version assigned to
    /// this write.
    ///
    /// # Errors
    ///
    /// Returns `MalformedKey` if the key fails validation, or an error if the
    /// storage operation fails.
    fn put(&self, key: &str, value: serde_json::Value) -> Result<u64>;

    /// Delete `key`, returning the removed record if it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete(&self, key: &str) -> Result<Option<Record>>;

    /// Enumerate keys in key order, strictly after `after`, at most `limit`
    ///
    /// This is the streaming primitive: callers page through the key space
    /// by passing the last key of the previous page. A page may be shorter
    /// than `limit` without the key space being exhausted; only an empty
    /// page marks the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_keys_after(&self, after: Option<&str>, limit: usize) -> Result<Vec<String>>;

    /// Set the namespace of exactly `key`, leaving its value untouched
    ///
    /// `None` writes the unset marker.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists under `key`.
    fn set_namespace(&self, key: &str, namespace: Option<String>) -> Result<()>;

    /// All records whose namespace equals `namespace`, in key order
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn scan_namespace(&self, namespace: &str) -> Result<Vec<Record>>;

    /// Number of records
    fn len(&self) -> usize;

    /// Whether the store holds no records
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key existing at call time
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_all_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list_keys_after(cursor.as_deref(), LIST_ALL_PAGE)?;
            if page.is_empty() {
                return Ok(keys);
            }
            cursor = page.last().cloned();
            keys.extend(page);
        }
    }
}

/// Ledger of migrations applied to a store
///
/// Kept apart from records so that running migrations never creates records.
pub trait MigrationLedger: Send + Sync {
    /// Applied migrations, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn applied(&self) -> Result<Vec<AppliedMigration>>;

    /// Append a ledger entry; replaces an existing entry with the same id
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn record_applied(&self, entry: AppliedMigration) -> Result<()>;

    /// Remove the entry for `id`, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove_applied(&self, id: &str) -> Result<bool>;
}
