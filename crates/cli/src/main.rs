//! fedstore CLI — migration and key tooling for a fedstore file store.
//!
//! - `fedstore migrate up` applies pending migrations (namespace backfill)
//! - `fedstore migrate down` reverts the most recent one
//! - `fedstore migrate status` lists the ledger
//! - `fedstore key namespace KEY` prints the namespace derived from a key
//!
//! Logging goes to stderr through `tracing-subscriber`; set `RUST_LOG` to
//! adjust (default `info`).

mod commands;
mod format;

use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use fedstore_core::derive_namespace;
use fedstore_migrate::{MigrateConfig, Migrator, CONFIG_FILE_NAME};
use fedstore_storage::{FileStore, SyncMode};

use commands::{build_cli, DEFAULT_STORE};
use format::{format_report, format_reports, format_status};

fn main() {
    init_tracing();

    let matches = build_cli().get_matches();
    let exit_code = match matches.subcommand() {
        Some(("migrate", sub)) => run_migrate(&matches, sub),
        Some(("key", sub)) => run_key(sub),
        _ => {
            eprintln!("(error) unknown command");
            2
        }
    };
    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn store_path(matches: &clap::ArgMatches) -> PathBuf {
    matches
        .get_one::<String>("store")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE))
}

/// Explicit `--config`, else `fedstore.toml` beside the store (created with
/// defaults on first use).
fn load_config(matches: &clap::ArgMatches, store: &Path) -> Result<MigrateConfig, String> {
    let path = match matches.get_one::<String>("config") {
        Some(p) => PathBuf::from(p),
        None => {
            let dir = store
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let path = dir.join(CONFIG_FILE_NAME);
            MigrateConfig::write_default_if_missing(&path).map_err(|e| e.to_string())?;
            path
        }
    };
    MigrateConfig::from_file(&path).map_err(|e| e.to_string())
}

fn run_migrate(root: &clap::ArgMatches, matches: &clap::ArgMatches) -> i32 {
    let path = store_path(root);
    let config = match load_config(root, &path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("(error) {}", e);
            return 1;
        }
    };

    let store = match FileStore::open_with(&path, SyncMode::Deferred) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("(error) Failed to open store '{}': {}", path.display(), e);
            return 1;
        }
    };

    let migrator = Migrator::with_builtin(config);
    let result = match matches.subcommand_name() {
        Some("up") => migrator.run_pending(&store).map(|r| format_reports(&r)),
        Some("down") => migrator.revert_last(&store).map(|r| match r {
            Some(report) => format_report(&report),
            None => "No applied migrations".to_string(),
        }),
        Some("status") => migrator.status(&store).map(|s| format_status(&s)),
        _ => {
            eprintln!("(error) unknown migrate command");
            return 2;
        }
    };

    // Persist whatever progress was made, even if the run failed part way
    let flushed = store.flush();

    let mut code = 0;
    match result {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("(error) {}", e);
            if e.is_retryable() {
                eprintln!("(hint) the migration is idempotent; re-run it once the store is reachable");
            }
            code = 1;
        }
    }
    if let Err(e) = flushed {
        eprintln!("(error) Failed to save store '{}': {}", path.display(), e);
        code = 1;
    }
    code
}

fn run_key(matches: &clap::ArgMatches) -> i32 {
    match matches.subcommand() {
        Some(("namespace", sub)) => {
            let key = sub
                .get_one::<String>("key")
                .map(String::as_str)
                .unwrap_or_default();
            match derive_namespace(key) {
                Ok(ns) => {
                    println!("{}", ns);
                    0
                }
                Err(e) => {
                    eprintln!("(error) {}", e);
                    1
                }
            }
        }
        _ => {
            eprintln!("(error) unknown key command");
            2
        }
    }
}
