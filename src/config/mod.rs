//! Configuration model for kvmutex.
//!
//! This module defines the MutexConfig struct, usually loaded from a YAML file.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, environment overrides, and
//! validation of the protocol's timing relationships.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::MutexConfig;
pub use types::{ENV_OLDEST_TOUCH_MS, ENV_STORE_DIR, NativeLockKind};
