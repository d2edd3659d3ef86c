//! Key-value media that lease records live in.
//!
//! The protocol needs nothing from a medium beyond plain reads, writes and
//! deletes of one record per lock name. There is no compare-and-swap; see the
//! engine for how claims are confirmed without one.
//!
//! Two media ship with the crate:
//! - [`FileStore`]: one JSON file per record in a shared directory, visible to
//!   every process on the host (persistent storage).
//! - [`MemoryStore`]: an in-process map, visible to every request in the
//!   process and gone when it exits (session storage).
//!
//! Keys are namespaced per medium so records never collide with unrelated
//! data kept in the same place.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::lease::LeaseRecord;
use std::fmt;

/// Key prefix for records in persistent storage.
pub const PERSISTENT_PREFIX: &str = "__mutex";

/// Key prefix for records in session storage.
pub const SESSION_PREFIX: &str = "mutex_";

/// A shared medium holding one lease record per key.
///
/// Calls are synchronous. The engine makes them from a runtime worker while
/// holding the request's state lock, once per acquisition tick and once per
/// heartbeat, so every call must return in well under `acquire_interval`.
/// Media with network or otherwise unbounded latency need a local cache in
/// front of them rather than a direct implementation.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read the record at `key`.
    ///
    /// Never fails: missing, unreadable or malformed data is reported as
    /// [`LeaseRecord::vacant`].
    fn get(&self, key: &str) -> LeaseRecord;

    /// Overwrite the record at `key`.
    fn set(&self, key: &str, record: &LeaseRecord) -> Result<()>;

    /// Delete the record at `key`. Deleting a missing record succeeds.
    fn clear(&self, key: &str) -> Result<()>;
}

/// Storage key of lock `name` in persistent storage.
pub fn persistent_key(name: &str) -> String {
    format!("{}{}", PERSISTENT_PREFIX, name)
}

/// Storage key of lock `name` in session storage.
pub fn session_key(name: &str) -> String {
    format!("{}{}", SESSION_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_per_medium() {
        assert_eq!(persistent_key("jobs"), "__mutexjobs");
        assert_eq!(session_key("jobs"), "mutex_jobs");
        assert_ne!(persistent_key("jobs"), session_key("jobs"));
    }
}
