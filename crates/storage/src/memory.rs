//! MemoryStore: in-memory record store with BTreeMap and version management
//!
//! This module implements the RecordStore trait using:
//! - `BTreeMap<String, Record>` for ordered key storage (cursor enumeration)
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing version numbers
//! - A namespace secondary index for namespace-scoped queries
//!
//! # Design Notes
//!
//! - **No version history**: Each key stores only its latest record
//! - **Lock order**: `data` before `namespace_index`, always
//! - **Legacy loads**: `from_parts` accepts records exactly as persisted,
//!   without key validation, so data written before validation existed can
//!   still be migrated (or rejected by the migration)

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use fedstore_core::{
    validate_key, AppliedMigration, Error, MigrationLedger, Record, RecordStore, Result,
};

use crate::index::NamespaceIndex;

/// In-memory record store
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`. Cloning is not
/// supported; share it behind an `Arc`.
#[derive(Debug)]
pub struct MemoryStore {
    /// The main data store: ordered map from key to record
    data: RwLock<BTreeMap<String, Record>>,
    /// Secondary index: namespace → keys
    namespace_index: RwLock<NamespaceIndex>,
    /// Applied-migrations ledger, oldest first
    ledger: RwLock<Vec<AppliedMigration>>,
    /// Global version counter for monotonically increasing versions
    version: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// Load pre-existing records
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self::from_parts(records, Vec::new())
    }

    /// Load pre-existing records together with a migration ledger
    ///
    /// The version counter resumes after the highest stored version. When a
    /// key appears more than once the last record wins.
    pub fn from_parts(
        records: impl IntoIterator<Item = Record>,
        ledger: Vec<AppliedMigration>,
    ) -> Self {
        let mut data = BTreeMap::new();
        for record in records {
            data.insert(record.key.clone(), record);
        }

        let mut index = NamespaceIndex::new();
        let mut max_version = 0;
        for record in data.values() {
            if let Some(ns) = &record.namespace {
                index.insert(ns, &record.key);
            }
            max_version = max_version.max(record.version);
        }

        debug!(
            target: "fedstore::store",
            records = data.len(),
            namespaces = index.len(),
            migrations = ledger.len(),
            "Loaded memory store"
        );

        Self {
            data: RwLock::new(data),
            namespace_index: RwLock::new(index),
            ledger: RwLock::new(ledger),
            version: AtomicU64::new(max_version),
        }
    }

    /// Snapshot of all records in key order
    pub fn records(&self) -> Vec<Record> {
        self.data.read().values().cloned().collect()
    }

    /// Snapshot of the ledger
    pub fn ledger_entries(&self) -> Vec<AppliedMigration> {
        self.ledger.read().clone()
    }

    /// Highest version assigned so far
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate the next version atomically
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<u64> {
        validate_key(key)?;

        let mut data = self.data.write();
        let version = self.next_version();
        let now = Utc::now();
        match data.get_mut(key) {
            Some(record) => {
                record.value = value;
                record.version = version;
                record.updated_at = now;
            }
            None => {
                let mut record = Record::new(key, value);
                record.version = version;
                record.updated_at = now;
                data.insert(key.to_string(), record);
            }
        }
        Ok(version)
    }

    fn delete(&self, key: &str) -> Result<Option<Record>> {
        let mut data = self.data.write();
        let removed = data.remove(key);
        if let Some(ns) = removed.as_ref().and_then(|r| r.namespace.as_deref()) {
            self.namespace_index.write().remove(ns, key);
        }
        Ok(removed)
    }

    fn list_keys_after(&self, after: Option<&str>, limit: usize) -> Result<Vec<String>> {
        let data = self.data.read();
        let lower = match after {
            Some(k) => Bound::Excluded(k),
            None => Bound::Unbounded,
        };
        Ok(data
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn set_namespace(&self, key: &str, namespace: Option<String>) -> Result<()> {
        let mut data = self.data.write();
        let record = data.get_mut(key).ok_or_else(|| Error::not_found(key))?;

        let old = record.namespace.take();
        self.namespace_index
            .write()
            .update(key, old.as_deref(), namespace.as_deref());

        record.namespace = namespace;
        record.version = self.next_version();
        record.updated_at = Utc::now();
        Ok(())
    }

    fn scan_namespace(&self, namespace: &str) -> Result<Vec<Record>> {
        let data = self.data.read();
        let index = self.namespace_index.read();
        Ok(index
            .get(namespace)
            .map(|keys| keys.iter().filter_map(|k| data.get(k).cloned()).collect())
            .unwrap_or_default())
    }

    fn len(&self) -> usize {
        self.data.read().len()
    }
}

impl MigrationLedger for MemoryStore {
    fn applied(&self) -> Result<Vec<AppliedMigration>> {
        Ok(self.ledger.read().clone())
    }

    fn record_applied(&self, entry: AppliedMigration) -> Result<()> {
        let mut ledger = self.ledger.write();
        ledger.retain(|e| e.id != entry.id);
        ledger.push(entry);
        Ok(())
    }

    fn remove_applied(&self, id: &str) -> Result<bool> {
        let mut ledger = self.ledger.write();
        let before = ledger.len();
        ledger.retain(|e| e.id != id);
        Ok(ledger.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.put("saml:config:tenant1", json!({"idp": "okta"})).unwrap();
        store.put("oidc:config:tenant2", json!({"idp": "auth0"})).unwrap();
        store.put("singleton", json!(1)).unwrap();
        store
    }

    #[test]
    fn test_put_get() {
        let store = seeded();
        let r = store.get("saml:config:tenant1").unwrap().unwrap();
        assert_eq!(r.value, json!({"idp": "okta"}));
        assert_eq!(r.namespace, None);
        assert!(store.get("missing").unwrap().is_none());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_versions_monotonic() {
        let store = MemoryStore::new();
        let v1 = store.put("a", json!(1)).unwrap();
        let v2 = store.put("b", json!(2)).unwrap();
        let v3 = store.put("a", json!(3)).unwrap();
        assert!(v1 < v2 && v2 < v3);
        assert_eq!(store.current_version(), v3);
    }

    #[test]
    fn test_put_rejects_empty_key() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.put("", json!(null)),
            Err(Error::MalformedKey { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_preserves_namespace() {
        let store = seeded();
        store
            .set_namespace("saml:config:tenant1", Some("saml:config".into()))
            .unwrap();
        store.put("saml:config:tenant1", json!("new")).unwrap();
        let r = store.get("saml:config:tenant1").unwrap().unwrap();
        assert_eq!(r.value, json!("new"));
        assert_eq!(r.namespace.as_deref(), Some("saml:config"));
    }

    #[test]
    fn test_set_namespace_does_not_touch_value() {
        let store = seeded();
        store
            .set_namespace("oidc:config:tenant2", Some("oidc:config".into()))
            .unwrap();
        let r = store.get("oidc:config:tenant2").unwrap().unwrap();
        assert_eq!(r.value, json!({"idp": "auth0"}));
        assert_eq!(r.namespace.as_deref(), Some("oidc:config"));
    }

    #[test]
    fn test_set_namespace_missing_key() {
        let store = seeded();
        let err = store.set_namespace("nope", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_namespace_exact_match_only() {
        let store = seeded();
        store.put("saml:config", json!(0)).unwrap();
        store
            .set_namespace("saml:config", Some("saml:config".into()))
            .unwrap();
        assert_eq!(
            store.get("saml:config:tenant1").unwrap().unwrap().namespace,
            None
        );
    }

    #[test]
    fn test_list_keys_after_pages() {
        let store = seeded();
        let first = store.list_keys_after(None, 2).unwrap();
        assert_eq!(first, vec!["oidc:config:tenant2", "saml:config:tenant1"]);
        let second = store.list_keys_after(first.last().map(String::as_str), 2).unwrap();
        assert_eq!(second, vec!["singleton"]);
        let third = store.list_keys_after(Some("singleton"), 2).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn test_list_all_keys() {
        let store = MemoryStore::new();
        for i in 0..2500 {
            store.put(&format!("k:{:05}", i), json!(i)).unwrap();
        }
        let keys = store.list_all_keys().unwrap();
        assert_eq!(keys.len(), 2500);
        assert_eq!(keys[0], "k:00000");
        assert_eq!(keys[2499], "k:02499");
    }

    #[test]
    fn test_scan_namespace_tracks_updates_and_deletes() {
        let store = seeded();
        store.put("saml:config:tenant3", json!(3)).unwrap();
        store
            .set_namespace("saml:config:tenant1", Some("saml:config".into()))
            .unwrap();
        store
            .set_namespace("saml:config:tenant3", Some("saml:config".into()))
            .unwrap();
        assert_eq!(store.scan_namespace("saml:config").unwrap().len(), 2);

        store.delete("saml:config:tenant3").unwrap();
        let hits = store.scan_namespace("saml:config").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "saml:config:tenant1");

        store.set_namespace("saml:config:tenant1", None).unwrap();
        assert!(store.scan_namespace("saml:config").unwrap().is_empty());
    }

    #[test]
    fn test_from_records_keeps_legacy_keys() {
        let store = MemoryStore::from_records(vec![
            Record::new("", json!("legacy")),
            Record::new("a:b", json!(1)).with_namespace("a:b"),
        ]);
        assert_eq!(store.len(), 2);
        assert!(store.get("").unwrap().is_some());
        assert_eq!(store.scan_namespace("a:b").unwrap().len(), 1);
    }

    #[test]
    fn test_version_resumes_after_load() {
        let mut r = Record::new("a", json!(1));
        r.version = 41;
        let store = MemoryStore::from_records(vec![r]);
        assert_eq!(store.put("b", json!(2)).unwrap(), 42);
    }

    #[test]
    fn test_ledger_record_and_remove() {
        let store = MemoryStore::new();
        store.record_applied(AppliedMigration::now("m1")).unwrap();
        store.record_applied(AppliedMigration::now("m2")).unwrap();
        store.record_applied(AppliedMigration::now("m1")).unwrap();
        let ids: Vec<_> = store.applied().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert!(store.remove_applied("m2").unwrap());
        assert!(!store.remove_applied("m2").unwrap());
        assert_eq!(store.applied().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_across_threads_behind_arc() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();

        let store = std::sync::Arc::new(seeded());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.put(&format!("state:t{}", i), json!(i)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 7);
    }
}
