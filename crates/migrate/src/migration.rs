//! Migration contract and run reports
//!
//! A migration is an explicit up/down function pair over a [`RecordStore`].
//! Nothing here requires a runner: callers can invoke `up`/`down` directly.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fedstore_core::{RecordStore, Result};

/// Which way a migration runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Forward ("up")
    Up,
    /// Backward ("down"), for rollback
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// A reversible schema-evolution step
pub trait Migration: Send + Sync {
    /// Stable identifier, recorded in the ledger
    fn id(&self) -> &str;

    /// Human-readable summary
    fn description(&self) -> &str;

    /// Apply the migration
    ///
    /// # Errors
    ///
    /// Errors abort the run. Updates already made are kept; migrations must
    /// be idempotent so that a re-run converges.
    fn up(&self, store: &dyn RecordStore) -> Result<MigrationReport>;

    /// Revert the migration
    ///
    /// # Errors
    ///
    /// As for [`Migration::up`].
    fn down(&self, store: &dyn RecordStore) -> Result<MigrationReport>;
}

/// Outcome of one migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migration id
    pub migration: String,
    /// Direction of the run
    pub direction: Direction,
    /// Keys enumerated
    pub scanned: usize,
    /// Records updated
    pub updated: usize,
    /// Keys deleted between enumeration and update
    pub not_found: Vec<String>,
    /// False if the run was cancelled before enumerating every key
    pub completed: bool,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl MigrationReport {
    /// Empty report for a run that is about to start
    pub fn start(migration: impl Into<String>, direction: Direction) -> Self {
        Self {
            migration: migration.into(),
            direction,
            scanned: 0,
            updated: 0,
            not_found: Vec::new(),
            completed: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: scanned {}, updated {}, missing {}{} in {:?}",
            self.migration,
            self.direction,
            self.scanned,
            self.updated,
            self.not_found.len(),
            if self.completed { "" } else { " (cancelled)" },
            self.elapsed
        )
    }
}

/// Cooperative cancellation flag shared with a running migration
///
/// Cancelling stops the run at the next record (sequential) or page
/// (parallel) boundary. Records already updated stay updated.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// New, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_report_display() {
        let mut report = MigrationReport::start("m1", Direction::Up);
        report.scanned = 3;
        report.updated = 2;
        report.not_found.push("gone".into());
        let text = report.to_string();
        assert!(text.contains("m1 up"));
        assert!(text.contains("scanned 3"));
        assert!(text.contains("missing 1"));
        assert!(text.contains("cancelled"));
    }

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
