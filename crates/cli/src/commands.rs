//! Clap command tree definition.

use clap::{Arg, Command};

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE: &str = "fedstore.json";

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("fedstore")
        .about("Record store maintenance for identity-federation metadata")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("store")
                .long("store")
                .help("Store file path (default: fedstore.json)")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Migration config (default: fedstore.toml next to the store)")
                .global(true),
        )
        .subcommand(build_migrate())
        .subcommand(build_key())
}

fn build_migrate() -> Command {
    Command::new("migrate")
        .about("Run or revert schema migrations")
        .subcommand_required(true)
        .subcommand(Command::new("up").about("Apply all pending migrations"))
        .subcommand(Command::new("down").about("Revert the most recently applied migration"))
        .subcommand(Command::new("status").about("List migrations and whether they are applied"))
}

fn build_key() -> Command {
    Command::new("key")
        .about("Composite-key utilities")
        .subcommand_required(true)
        .subcommand(
            Command::new("namespace")
                .about("Print the namespace derived from a key")
                .arg(Arg::new("key").required(true).help("Composite key")),
        )
}
