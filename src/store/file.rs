//! Directory-backed key-value store shared across processes.
//!
//! Each key is one file, `<encoded key>.json`, in the store directory. Keys are
//! percent-encoded so that any lock name maps to a single flat filename.

use super::KeyValueStore;
use crate::error::{MutexError, Result};
use crate::fs::atomic_write;
use crate::lease::LeaseRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// Lease records stored as JSON files in one directory.
///
/// Every call is blocking file I/O on one small file. Keep the directory on a
/// local filesystem; a network mount can stall the runtime worker polling it.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// Fails when the directory cannot be created or is not writable, which is
    /// how capability detection decides whether this medium is usable.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            MutexError::Storage(format!(
                "failed to create store directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let metadata = fs::metadata(&dir).map_err(|e| {
            MutexError::Storage(format!(
                "failed to inspect store directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        if metadata.permissions().readonly() {
            return Err(MutexError::Storage(format!(
                "store directory '{}' is read-only",
                dir.display()
            )));
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), RECORD_EXTENSION))
    }

    /// All records currently stored, sorted by key.
    ///
    /// Unreadable records are reported as vacant, like [`KeyValueStore::get`].
    pub fn entries(&self) -> Result<Vec<(String, LeaseRecord)>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(MutexError::Storage(format!(
                    "failed to read store directory '{}': {}",
                    self.dir.display(),
                    e
                )));
            }
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| {
                MutexError::Storage(format!("failed to read store directory entry: {}", e))
            })?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Temporary files from in-flight writes start with a dot.
            if stem.starts_with('.') {
                continue;
            }
            let Some(key) = decode_key(stem) else {
                continue;
            };

            entries.push((key.clone(), self.get(&key)));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> LeaseRecord {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(text) => LeaseRecord::decode_or_vacant(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => LeaseRecord::vacant(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable lease record");
                LeaseRecord::vacant()
            }
        }
    }

    fn set(&self, key: &str, record: &LeaseRecord) -> Result<()> {
        let json = record.to_json()?;
        atomic_write(self.record_path(key), json.as_bytes())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MutexError::Storage(format!(
                "failed to clear '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::HolderId;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_reads_vacant() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();

        assert_eq!(store.get("__mutexjobs"), LeaseRecord::vacant());
    }

    #[test]
    fn test_set_get_clear_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let record = LeaseRecord::held_by(&HolderId::from("holder"), 1234);

        store.set("__mutexjobs", &record).unwrap();
        assert!(store.record_path("__mutexjobs").exists());
        assert_eq!(store.get("__mutexjobs"), record);

        store.clear("__mutexjobs").unwrap();
        assert!(!store.record_path("__mutexjobs").exists());
        // Clearing twice is fine.
        store.clear("__mutexjobs").unwrap();
    }

    #[test]
    fn test_two_handles_share_the_directory() {
        let temp_dir = TempDir::new().unwrap();
        let a = FileStore::open(temp_dir.path()).unwrap();
        let b = FileStore::open(temp_dir.path()).unwrap();

        a.set("k", &LeaseRecord::held_by(&HolderId::from("a"), 1))
            .unwrap();
        assert_eq!(b.get("k").holder_id.as_str(), "a");
    }

    #[test]
    fn test_malformed_file_reads_vacant() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        fs::write(store.record_path("k"), "garbage").unwrap();

        assert_eq!(store.get("k"), LeaseRecord::vacant());
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");

        let store = FileStore::open(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_open_fails_when_path_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        fs::write(&file, "x").unwrap();

        let err = FileStore::open(&file).unwrap_err();
        assert!(matches!(err, MutexError::Storage(_)));
    }

    #[test]
    fn test_keys_with_separators_stay_flat() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let key = "__mutexjobs/nightly run.v2";

        store
            .set(key, &LeaseRecord::held_by(&HolderId::from("a"), 1))
            .unwrap();

        let path = store.record_path(key);
        assert_eq!(path.parent().unwrap(), temp_dir.path());
        assert_eq!(store.get(key).holder_id.as_str(), "a");
    }

    #[test]
    fn test_entries_lists_records_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        store
            .set("__mutexb", &LeaseRecord::held_by(&HolderId::from("2"), 2))
            .unwrap();
        store
            .set("__mutexa/x", &LeaseRecord::held_by(&HolderId::from("1"), 1))
            .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = store.entries().unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["__mutexa/x", "__mutexb"]);
        assert_eq!(entries[0].1.holder_id.as_str(), "1");
    }

    #[test]
    fn test_key_encoding_roundtrip() {
        for key in ["plain", "with space", "a/b", "ünï", "100%"] {
            assert_eq!(decode_key(&encode_key(key)).as_deref(), Some(key));
        }
        assert_eq!(encode_key("a.b"), "a%2Eb");
        assert_eq!(decode_key("%G1"), None);
    }
}
