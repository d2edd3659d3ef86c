//! Process-wide setup for the kvmutex binary.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v` (warn, info,
/// debug).
pub fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

/// Create the tokio runtime commands run on.
pub fn create_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to create tokio runtime")
}
