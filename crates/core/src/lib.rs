//! Core types and traits for fedstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy
//! - key: Composite-key convention (separator, namespace derivation, validation)
//! - Record: A stored value with its derived namespace
//! - Traits: Store abstractions (RecordStore, MigrationLedger)
//! - setup: Connection-setup link collaborator interface

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod record;
pub mod setup;
pub mod traits;

pub use error::{Error, Result};
pub use key::{compose, derive_namespace, validate_key, CompositeKey, MAX_KEY_BYTES, SEPARATOR};
pub use record::{AppliedMigration, Record};
pub use setup::{ConnectionSink, IdpType, SetupLink, SetupOutcome};
pub use traits::{MigrationLedger, RecordStore};
