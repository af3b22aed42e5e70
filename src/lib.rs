//! fedstore - namespaced key-value record store for identity-federation metadata
//!
//! Records (SAML/OIDC connection metadata, state, sessions) live under
//! composite keys such as `saml:config:tenant1`. Each record carries a derived
//! `namespace` (the first two key tokens) used to scope lookups.
//!
//! # Quick Start
//!
//! ```
//! use fedstore::{MemoryStore, NamespaceBackfill, RecordStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.put("saml:config:tenant1", json!({"entityId": "urn:example"}))?;
//!
//! NamespaceBackfill::new().forward(&store)?;
//! assert_eq!(store.scan_namespace("saml:config")?.len(), 1);
//! # Ok::<(), fedstore::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `fedstore-core`: errors, composite-key convention, store traits
//! - `fedstore-storage`: memory and JSON-file backends
//! - `fedstore-migrate`: namespace backfill and the migration runner

pub use fedstore_core::*;
pub use fedstore_migrate::{
    CancellationToken, Direction, MigrateConfig, Migration, MigrationReport, MigrationStatus,
    Migrator, NamespaceBackfill,
};
pub use fedstore_storage::{FileStore, MemoryStore, NamespaceIndex, SyncMode};
