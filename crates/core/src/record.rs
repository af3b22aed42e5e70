//! Stored record types
//!
//! A [`Record`] is what the store holds under a key: an opaque JSON payload,
//! the derived namespace, and the store's bookkeeping (version, timestamp).
//! The namespace is not part of the record's identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record addressed by a composite key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique, immutable key
    pub key: String,
    /// Opaque payload written by external collaborators
    pub value: serde_json::Value,
    /// Derived grouping attribute; `None` is the unset marker
    #[serde(default)]
    pub namespace: Option<String>,
    /// Store-assigned version of the last write to this record
    #[serde(default)]
    pub version: u64,
    /// Time of the last write to this record
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a record with no namespace
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
            namespace: None,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Builder: set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Whether the namespace carries data
    #[inline]
    pub fn has_namespace(&self) -> bool {
        self.namespace.is_some()
    }
}

/// An entry in a store's applied-migrations ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Stable migration identifier
    pub id: String,
    /// When the migration finished its forward run
    pub applied_at: DateTime<Utc>,
}

impl AppliedMigration {
    /// Ledger entry stamped with the current time
    pub fn now(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            applied_at: Utc::now(),
        }
    }
}
