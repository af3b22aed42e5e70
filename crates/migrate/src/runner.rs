//! Migrator: ordered migration registry with an applied ledger
//!
//! Migrations run in registration order. After a forward run completes the
//! migration's id is appended to the store's [`MigrationLedger`]; a failed or
//! cancelled run is not recorded, so the next `run_pending` retries it from
//! scratch (safe because migrations are idempotent).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use fedstore_core::{AppliedMigration, Error, MigrationLedger, RecordStore, Result};

use crate::config::MigrateConfig;
use crate::migration::{Migration, MigrationReport};
use crate::namespace::NamespaceBackfill;

/// Applied state of one registered migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration id
    pub id: String,
    /// Migration description
    pub description: String,
    /// When it was applied, `None` if pending
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    /// Whether the migration is in the ledger
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Ordered set of migrations
#[derive(Default)]
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("migrations", &self.ids())
            .finish()
    }
}

impl Migrator {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in migration
    pub fn with_builtin(config: MigrateConfig) -> Self {
        let mut migrator = Self::new();
        migrator
            .migrations
            .push(Box::new(NamespaceBackfill::with_config(config)));
        migrator
    }

    /// Append a migration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a migration with the same id is registered.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> Result<()> {
        if self.migrations.iter().any(|m| m.id() == migration.id()) {
            return Err(Error::invalid_input(format!(
                "migration '{}' is already registered",
                migration.id()
            )));
        }
        self.migrations.push(migration);
        Ok(())
    }

    /// Registered ids in order
    pub fn ids(&self) -> Vec<&str> {
        self.migrations.iter().map(|m| m.id()).collect()
    }

    /// Registered migrations not yet in the ledger
    pub fn pending<S>(&self, store: &S) -> Result<Vec<&str>>
    where
        S: RecordStore + MigrationLedger,
    {
        let applied = applied_ids(store)?;
        Ok(self
            .migrations
            .iter()
            .map(|m| m.id())
            .filter(|id| !applied.contains(*id))
            .collect())
    }

    /// Apply every pending migration in order
    ///
    /// Stops at the first cancelled run, returning the reports so far.
    ///
    /// # Errors
    ///
    /// The first migration error; earlier migrations stay applied.
    pub fn run_pending<S>(&self, store: &S) -> Result<Vec<MigrationReport>>
    where
        S: RecordStore + MigrationLedger,
    {
        let applied = applied_ids(store)?;
        let mut reports = Vec::new();

        for migration in self.migrations.iter().filter(|m| !applied.contains(m.id())) {
            info!(target: "fedstore::migrate", migration = migration.id(), "Applying migration");
            let report = migration.up(store)?;
            let completed = report.completed;
            reports.push(report);

            if !completed {
                warn!(
                    target: "fedstore::migrate",
                    migration = migration.id(),
                    "Migration cancelled, not recorded as applied"
                );
                break;
            }
            store.record_applied(AppliedMigration::now(migration.id()))?;
        }

        Ok(reports)
    }

    /// Revert the most recently applied migration
    ///
    /// Returns `Ok(None)` when the ledger is empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the ledger names a migration that is not
    /// registered, or the migration's own error.
    pub fn revert_last<S>(&self, store: &S) -> Result<Option<MigrationReport>>
    where
        S: RecordStore + MigrationLedger,
    {
        let Some(last) = store.applied()?.pop() else {
            return Ok(None);
        };

        let migration = self.find(&last.id).ok_or_else(|| {
            Error::invalid_input(format!(
                "applied migration '{}' is not registered",
                last.id
            ))
        })?;

        info!(target: "fedstore::migrate", migration = %last.id, "Reverting migration");
        let report = migration.down(store)?;
        if report.completed {
            store.remove_applied(&last.id)?;
        } else {
            warn!(
                target: "fedstore::migrate",
                migration = %last.id,
                "Revert cancelled, migration left in ledger"
            );
        }
        Ok(Some(report))
    }

    /// Applied state of every registered migration
    pub fn status<S>(&self, store: &S) -> Result<Vec<MigrationStatus>>
    where
        S: RecordStore + MigrationLedger,
    {
        let applied = store.applied()?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                id: m.id().to_string(),
                description: m.description().to_string(),
                applied_at: applied
                    .iter()
                    .find(|e| e.id == m.id())
                    .map(|e| e.applied_at),
            })
            .collect())
    }

    fn find(&self, id: &str) -> Option<&dyn Migration> {
        self.migrations
            .iter()
            .find(|m| m.id() == id)
            .map(|m| &**m)
    }
}

fn applied_ids<L: MigrationLedger + ?Sized>(ledger: &L) -> Result<HashSet<String>> {
    Ok(ledger.applied()?.into_iter().map(|e| e.id).collect())
}
