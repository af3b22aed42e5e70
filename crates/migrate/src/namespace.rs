//! Namespace backfill migration
//!
//! Forward: every record's namespace is set to `derive_namespace(key)`.
//! Backward: every record's namespace is set to the unset marker (`None`).
//!
//! ## Algorithm
//!
//! Keys are streamed from the store in pages of `page_size` using the
//! `list_keys_after` cursor, never loaded all at once. Each key gets one
//! exact-match `set_namespace` point update. Updates are full overwrites
//! computed from the key alone, so both directions are idempotent and any
//! ordering (or parallel interleaving) of updates converges to the same state.
//!
//! ## Failures
//!
//! - Empty key (forward only): `MalformedKey`, the run aborts. Records updated
//!   before the offending key keep their new namespace.
//! - `NotFound` on update: the key was deleted after enumeration. Logged,
//!   reported and skipped unless `continue_on_not_found` is false.
//! - Any other store error is returned to the caller; re-run the whole
//!   migration once the store is reachable.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use fedstore_core::{derive_namespace, Error, RecordStore, Result};

use crate::config::MigrateConfig;
use crate::migration::{CancellationToken, Direction, Migration, MigrationReport};

/// Result of a single point update
enum Applied {
    Updated,
    Missing(String),
}

/// Backfills the derived `namespace` attribute on every record
#[derive(Debug, Clone, Default)]
pub struct NamespaceBackfill {
    config: MigrateConfig,
    cancel: CancellationToken,
}

impl NamespaceBackfill {
    /// Ledger id
    pub const ID: &'static str = "1648805358887-namespace-update";

    /// Backfill with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Backfill with explicit settings
    pub fn with_config(config: MigrateConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Settings in use
    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Populate `namespace` on every record
    ///
    /// # Errors
    ///
    /// `MalformedKey` for an empty key; store errors as described in the
    /// module docs.
    pub fn forward(&self, store: &dyn RecordStore) -> Result<MigrationReport> {
        self.drive(store, Direction::Up)
    }

    /// Clear `namespace` on every record
    ///
    /// # Errors
    ///
    /// Store errors as described in the module docs.
    pub fn backward(&self, store: &dyn RecordStore) -> Result<MigrationReport> {
        self.drive(store, Direction::Down)
    }

    /// Namespace to write for `key` in `direction`
    fn target(direction: Direction, key: &str) -> Result<Option<String>> {
        match direction {
            Direction::Up => derive_namespace(key).map(Some),
            Direction::Down => Ok(None),
        }
    }

    fn apply_one(&self, store: &dyn RecordStore, direction: Direction, key: &str) -> Result<Applied> {
        let namespace = Self::target(direction, key)?;
        match store.set_namespace(key, namespace) {
            Ok(()) => Ok(Applied::Updated),
            Err(e) if e.is_not_found() && self.config.continue_on_not_found => {
                warn!(
                    target: "fedstore::migrate",
                    key = %key,
                    direction = %direction,
                    "Record deleted during migration, skipping"
                );
                Ok(Applied::Missing(key.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn tally(report: &mut MigrationReport, applied: Applied) {
        match applied {
            Applied::Updated => report.updated += 1,
            Applied::Missing(key) => report.not_found.push(key),
        }
    }

    fn drive(&self, store: &dyn RecordStore, direction: Direction) -> Result<MigrationReport> {
        self.config.validate()?;

        let started = Instant::now();
        let mut report = MigrationReport::start(Self::ID, direction);

        info!(
            target: "fedstore::migrate",
            migration = Self::ID,
            direction = %direction,
            page_size = self.config.page_size,
            parallelism = self.config.parallelism,
            "Namespace migration started"
        );

        let pool = if self.config.parallelism > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.parallelism)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to build worker pool: {}", e)))?,
            )
        } else {
            None
        };

        let result = self.run_pages(store, direction, pool.as_ref(), &mut report);
        report.elapsed = started.elapsed();

        match result {
            Ok(completed) => {
                report.completed = completed;
                info!(
                    target: "fedstore::migrate",
                    migration = Self::ID,
                    direction = %direction,
                    scanned = report.scanned,
                    updated = report.updated,
                    missing = report.not_found.len(),
                    completed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Namespace migration finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    target: "fedstore::migrate",
                    migration = Self::ID,
                    direction = %direction,
                    scanned = report.scanned,
                    updated = report.updated,
                    error = %e,
                    "Namespace migration aborted"
                );
                Err(e)
            }
        }
    }

    /// Stream pages until the key space is exhausted; `Ok(false)` if cancelled
    fn run_pages(
        &self,
        store: &dyn RecordStore,
        direction: Direction,
        pool: Option<&rayon::ThreadPool>,
        report: &mut MigrationReport,
    ) -> Result<bool> {
        let mut cursor: Option<String> = None;
        let mut page_no = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }

            let page = store.list_keys_after(cursor.as_deref(), self.config.page_size)?;
            if page.is_empty() {
                return Ok(true);
            }
            page_no += 1;
            debug!(
                target: "fedstore::migrate",
                page = page_no,
                keys = page.len(),
                "Migrating page"
            );

            match pool {
                Some(pool) => {
                    let outcomes: Vec<Result<Applied>> = pool.install(|| {
                        page.par_iter()
                            .map(|key| self.apply_one(store, direction, key))
                            .collect()
                    });
                    report.scanned += page.len();
                    for outcome in outcomes {
                        Self::tally(report, outcome?);
                    }
                }
                None => {
                    for key in &page {
                        if self.cancel.is_cancelled() {
                            return Ok(false);
                        }
                        report.scanned += 1;
                        let applied = self.apply_one(store, direction, key)?;
                        Self::tally(report, applied);
                    }
                }
            }

            cursor = page.last().cloned();
        }
    }
}

impl Migration for NamespaceBackfill {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Derive record namespace from the first two key tokens"
    }

    fn up(&self, store: &dyn RecordStore) -> Result<MigrationReport> {
        self.forward(store)
    }

    fn down(&self, store: &dyn RecordStore) -> Result<MigrationReport> {
        self.backward(store)
    }
}
