//! MutexConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for mutex acquisition.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    // =========================================================================
    // Protocol timing
    // =========================================================================
    /// Age in milliseconds after which a lease record may be reclaimed.
    #[serde(default = "default_oldest_touch_ms")]
    pub oldest_touch_ms: u64,

    /// Period of the acquisition poll, in milliseconds.
    #[serde(default = "default_acquire_interval_ms")]
    pub acquire_interval_ms: u64,

    /// Period of the holder's heartbeat, in milliseconds.
    #[serde(default = "default_touch_interval_ms")]
    pub touch_interval_ms: u64,

    /// Period of the native-lock timeout watchdog, in milliseconds.
    #[serde(default = "default_native_poll_interval_ms")]
    pub native_poll_interval_ms: u64,

    // =========================================================================
    // Backends
    // =========================================================================
    /// Directory shared by file-backed records and file locks.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Native exclusive lock to prefer over the storage protocol.
    #[serde(default)]
    pub native_lock: NativeLockKind,

    /// Whether file-backed (cross-process) storage may be used.
    #[serde(default = "default_true")]
    pub enable_persistent_store: bool,

    /// Whether in-process storage may be used.
    #[serde(default = "default_true")]
    pub enable_session_store: bool,

    /// Whether to write `user@HOST` into lease records.
    #[serde(default = "default_true")]
    pub record_owner: bool,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            oldest_touch_ms: default_oldest_touch_ms(),
            acquire_interval_ms: default_acquire_interval_ms(),
            touch_interval_ms: default_touch_interval_ms(),
            native_poll_interval_ms: default_native_poll_interval_ms(),
            store_dir: default_store_dir(),
            native_lock: NativeLockKind::default(),
            enable_persistent_store: default_true(),
            enable_session_store: default_true(),
            record_owner: default_true(),
        }
    }
}
