//! Configuration types and defaults for kvmutex.
//!
//! This module defines enums, constants, and default value functions
//! used by the MutexConfig struct.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which native exclusive-lock primitive to offer, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NativeLockKind {
    /// OS advisory locks on files in the store directory (default, cross-process).
    #[default]
    File,
    /// Named locks inside this process only.
    Local,
    /// No native lock; always use the storage protocol.
    Disabled,
}

impl NativeLockKind {
    /// Parse a native lock kind from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "local" => Some(Self::Local),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Environment variable overriding `store_dir`.
pub const ENV_STORE_DIR: &str = "KVMUTEX_STORE_DIR";

/// Environment variable overriding `oldest_touch_ms`.
pub const ENV_OLDEST_TOUCH_MS: &str = "KVMUTEX_OLDEST_TOUCH_MS";

pub(crate) fn default_oldest_touch_ms() -> u64 {
    2000
}

pub(crate) fn default_acquire_interval_ms() -> u64 {
    1
}

pub(crate) fn default_touch_interval_ms() -> u64 {
    5
}

pub(crate) fn default_native_poll_interval_ms() -> u64 {
    10
}

pub(crate) fn default_store_dir() -> PathBuf {
    std::env::temp_dir().join("kvmutex")
}

pub(crate) fn default_true() -> bool {
    true
}
