//! Storage layer for fedstore
//!
//! This crate implements the record store backends:
//! - MemoryStore: BTreeMap-based storage with RwLock
//! - FileStore: MemoryStore persisted to a JSON file with atomic renames
//! - NamespaceIndex: namespace → keys secondary index
//!
//! Both backends implement `RecordStore` and `MigrationLedger` from
//! `fedstore-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod index;
pub mod memory;

pub use file::{FileStore, SyncMode};
pub use index::NamespaceIndex;
pub use memory::MemoryStore;
