//! In-process key-value store.

use super::KeyValueStore;
use crate::error::Result;
use crate::lease::LeaseRecord;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

static PROCESS_STORE: LazyLock<MemoryStore> = LazyLock::new(MemoryStore::new);

/// Map of encoded records shared by every clone.
///
/// Records are kept as JSON text so that reads go through the same decoding
/// (and the same malformed-data recovery) as on-disk records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store, private to its clones.
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by every request in this process.
    pub fn process_wide() -> Self {
        PROCESS_STORE.clone()
    }

    /// Store raw text at `key`, bypassing record encoding.
    pub fn set_raw(&self, key: &str, text: &str) {
        self.entries().insert(key.to_string(), text.to_string());
    }

    /// Raw text stored at `key`, if any.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> LeaseRecord {
        match self.entries().get(key) {
            Some(text) => LeaseRecord::decode_or_vacant(text),
            None => LeaseRecord::vacant(),
        }
    }

    fn set(&self, key: &str, record: &LeaseRecord) -> Result<()> {
        let text = record.to_json()?;
        self.entries().insert(key.to_string(), text);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}
