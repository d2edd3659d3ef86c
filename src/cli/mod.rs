//! CLI argument parsing for kvmutex.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// kvmutex: named mutual exclusion over a shared key-value medium.
///
/// Locks are held by refreshing a lease record; a holder that stops
/// refreshing loses the lock once its record goes stale.
#[derive(Parser, Debug)]
#[command(name = "kvmutex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for lease records and lock files (overrides config).
    #[arg(long, global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for kvmutex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a named mutex.
    ///
    /// Waits for the mutex, runs the command, releases the mutex and exits
    /// with the command's exit code.
    Run(RunArgs),

    /// List lease records in persistent storage.
    ///
    /// Shows holder, owner, age and whether each record is stale.
    Status(StatusArgs),

    /// Force-clear a lease record in persistent storage.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(ClearArgs),

    /// Show the backends usable right now, best first.
    Backends,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Name of the mutex to hold.
    pub name: String,

    /// Give up after this many milliseconds (0 waits forever).
    #[arg(long, default_value_t = 0)]
    pub timeout_ms: u64,

    /// Auto-release after this many milliseconds (0 never expires).
    #[arg(long, default_value_t = 0)]
    pub expires_ms: u64,

    /// Command line to run, split shell-style.
    #[arg(long, conflicts_with = "command")]
    pub shell: Option<String>,

    /// Command and arguments to run.
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Only show mutexes whose name matches this glob.
    pub pattern: Option<String>,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Name of the mutex whose record should be cleared.
    pub name: String,

    /// Force clearing the record (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
