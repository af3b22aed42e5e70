//! Secondary index for namespace queries
//!
//! NamespaceIndex maps namespace → keys so that downstream lookups by the
//! populated namespace column do not scan the whole store.

use std::collections::{BTreeMap, BTreeSet};

/// Secondary index: namespace → Keys
///
/// Only records with a namespace set appear in the index.
#[derive(Debug, Default, Clone)]
pub struct NamespaceIndex {
    index: BTreeMap<String, BTreeSet<String>>,
}

impl NamespaceIndex {
    /// Create a new empty NamespaceIndex
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    /// Add key to namespace's index
    pub fn insert(&mut self, namespace: &str, key: &str) {
        self.index
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// Remove key from namespace's index
    ///
    /// If the set becomes empty, removes the namespace entry entirely
    /// to avoid accumulating empty sets.
    pub fn remove(&mut self, namespace: &str, key: &str) {
        if let Some(keys) = self.index.get_mut(namespace) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(namespace);
            }
        }
    }

    /// Move `key` from its old namespace (if any) to the new one (if any)
    pub fn update(&mut self, key: &str, old: Option<&str>, new: Option<&str>) {
        if old == new {
            return;
        }
        if let Some(old) = old {
            self.remove(old, key);
        }
        if let Some(new) = new {
            self.insert(new, key);
        }
    }

    /// Keys in a namespace, in key order
    pub fn get(&self, namespace: &str) -> Option<&BTreeSet<String>> {
        self.index.get(namespace)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the number of namespaces in the index
    pub fn len(&self) -> usize {
        self.index.len()
    }
}
