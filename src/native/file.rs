//! Cross-process exclusive locks on files, via `fs2`.
//!
//! The OS releases the lock when the holder's file handle closes, including
//! when the holding process dies.

use super::{NativeExclusiveLock, NativeGrant, NativeLockError};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often a contended file lock is retried.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Exclusive locks on `<dir>/<name>.lock`.
#[derive(Debug, Clone)]
pub struct FileLockManager {
    dir: PathBuf,
    retry_interval: Duration,
}

/// Held OS lock; unlocked when dropped.
#[derive(Debug)]
struct FileLockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to unlock file lock");
        }
    }
}

impl FileLockManager {
    /// Open a manager rooted at `dir`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, NativeLockError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            NativeLockError::Io(format!(
                "failed to create lock directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        })
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Path of the lock file for `name`.
    pub fn lock_path(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.lock", safe))
    }

    fn open_lock_file(&self, path: &Path) -> Result<File, NativeLockError> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                NativeLockError::Io(format!(
                    "failed to open lock file '{}': {}",
                    path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl NativeExclusiveLock for FileLockManager {
    async fn request(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<NativeGrant, NativeLockError> {
        let path = self.lock_path(name);
        let file = self.open_lock_file(&path)?;

        loop {
            if cancel.is_cancelled() {
                return Err(NativeLockError::Aborted);
            }

            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(NativeGrant::new(FileLockGuard { file, path })),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {}
                Err(e) => {
                    return Err(NativeLockError::Io(format!(
                        "failed to lock '{}': {}",
                        path.display(),
                        e
                    )));
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(NativeLockError::Aborted),
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_grants_free_lock_and_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileLockManager::open(temp_dir.path()).unwrap();

        let grant = manager.request("jobs", CancellationToken::new()).await;

        assert!(grant.is_ok());
        assert!(manager.lock_path("jobs").exists());
    }

    #[tokio::test]
    async fn test_contended_request_waits_for_release() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileLockManager::open(temp_dir.path())
            .unwrap()
            .with_retry_interval(Duration::from_millis(1));
        let first = manager
            .request("jobs", CancellationToken::new())
            .await
            .unwrap();

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.request("jobs", CancellationToken::new()).await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!waiter.is_finished());

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_aborts_contended_request() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileLockManager::open(temp_dir.path()).unwrap();
        let _held = manager
            .request("jobs", CancellationToken::new())
            .await
            .unwrap();

        let token = CancellationToken::new();
        let waiter = {
            let manager = manager.clone();
            let token = token.clone();
            tokio::spawn(async move { manager.request("jobs", token).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(NativeLockError::Aborted)));
    }

    #[test]
    fn test_lock_path_is_flat() {
        let manager = FileLockManager::open(std::env::temp_dir()).unwrap();
        let path = manager.lock_path("a/b c");
        assert_eq!(path.file_name().unwrap(), "a_b_c.lock");
    }
}
