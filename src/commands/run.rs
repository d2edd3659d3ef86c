//! Implementation of the `kvmutex run` command.

use crate::cli::RunArgs;
use kvmutex::config::MutexConfig;
use kvmutex::error::{MutexError, Result};
use kvmutex::exit_codes;
use kvmutex::{AcquireOptions, MutexHandle, MutexService};
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::Runtime;

/// Exit code reported when the run is interrupted with Ctrl-C.
const INTERRUPTED: i32 = 130;

/// Hold the mutex while running the command; return the command's exit code.
pub fn cmd_run(config: &MutexConfig, args: RunArgs, runtime: &Runtime) -> Result<i32> {
    let argv = command_line(&args)?;
    let service = MutexService::from_config(config);

    runtime.block_on(async {
        let options = AcquireOptions::new()
            .timeout(Duration::from_millis(args.timeout_ms))
            .expires(Duration::from_millis(args.expires_ms))
            .on_expire(|handle: &MutexHandle| {
                tracing::warn!(name = %handle.name(), "mutex expired while the command was still running");
            });

        let handle = service.acquire(&args.name, options)?.await?;
        tracing::info!(name = %args.name, backend = %handle.backend(), "running command under mutex");

        let result = run_child(&argv).await;
        if let Err(e) = handle.ensure_held() {
            tracing::warn!(error = %e, "command finished without holding the mutex");
        }
        handle.release();
        result
    })
}

/// The argv to execute, from `--shell` or the trailing arguments.
fn command_line(args: &RunArgs) -> Result<Vec<String>> {
    let argv = match &args.shell {
        Some(line) => shell_words::split(line).map_err(|e| {
            MutexError::UserError(format!("failed to parse --shell command '{}': {}", line, e))
        })?,
        None => args.command.clone(),
    };

    if argv.is_empty() {
        return Err(MutexError::UserError(
            "no command given. Pass it after `--` or with --shell".to_string(),
        ));
    }
    Ok(argv)
}

async fn run_child(argv: &[String]) -> Result<i32> {
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| MutexError::UserError("no command given".to_string()))?;

    let mut child = Command::new(program)
        .args(rest)
        .spawn()
        .map_err(|e| MutexError::UserError(format!("failed to run '{}': {}", program, e)))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| {
                MutexError::UserError(format!("failed to wait for '{}': {}", program, e))
            })?;
            Ok(status.code().unwrap_or(exit_codes::USER_ERROR))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(program = %program, "interrupted, stopping command");
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to stop command");
            }
            Ok(INTERRUPTED)
        }
    }
}
