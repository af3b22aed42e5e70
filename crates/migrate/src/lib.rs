//! Schema-evolution migrations for fedstore
//!
//! - `NamespaceBackfill`: derives each record's namespace from its composite
//!   key (forward) or clears it (backward)
//! - `Migrator`: runs registered migrations in order against a store's ledger
//! - `MigrateConfig`: page size, parallelism and NotFound policy from
//!   `fedstore.toml`
//!
//! Migrations are plain callable up/down pairs. `NamespaceBackfill::forward`
//! and `NamespaceBackfill::backward` can be invoked directly without a
//! `Migrator`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod migration;
pub mod namespace;
pub mod runner;

pub use config::{MigrateConfig, CONFIG_FILE_NAME};
pub use migration::{CancellationToken, Direction, Migration, MigrationReport};
pub use namespace::NamespaceBackfill;
pub use runner::{MigrationStatus, Migrator};
