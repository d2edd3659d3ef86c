//! Command implementations for kvmutex.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, and the config resolution every command shares.

mod backends;
mod clear;
mod run;
mod status;

use crate::cli::{Cli, Command};
use kvmutex::config::MutexConfig;
use kvmutex::error::Result;
use kvmutex::exit_codes;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success. `run` passes through the
/// exit code of the command it ran.
pub fn dispatch(cli: Cli, runtime: &Runtime) -> Result<i32> {
    let config = resolve_config(cli.config.as_deref(), cli.store_dir)?;

    match cli.command {
        Command::Run(args) => run::cmd_run(&config, args, runtime),
        Command::Status(args) => status::cmd_status(&config, args).map(|()| exit_codes::SUCCESS),
        Command::Clear(args) => clear::cmd_clear(&config, args).map(|()| exit_codes::SUCCESS),
        Command::Backends => backends::cmd_backends(&config).map(|()| exit_codes::SUCCESS),
    }
}

/// Build the effective config.
///
/// Precedence, lowest first: defaults, config file, environment, `--store-dir`.
pub fn resolve_config(path: Option<&Path>, store_dir: Option<PathBuf>) -> Result<MutexConfig> {
    let mut config = match path {
        Some(path) => MutexConfig::load(path)?,
        None => MutexConfig::default(),
    };

    config.apply_env_overrides()?;

    if let Some(dir) = store_dir {
        config.store_dir = dir;
    }

    tracing::debug!(store_dir = %config.store_dir.display(), "resolved config");
    Ok(config)
}
