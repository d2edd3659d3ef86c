//! In-process named exclusive locks.

use super::{NativeExclusiveLock, NativeGrant, NativeLockError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

static PROCESS_LOCKS: LazyLock<LocalLockManager> = LazyLock::new(LocalLockManager::new);

/// Named async mutexes shared by every clone.
///
/// Waiters on the same name are served in request order. A name's entry is
/// dropped once nobody holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct LocalLockManager {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LocalLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager shared by every request in this process.
    pub fn process_wide() -> Self {
        PROCESS_LOCKS.clone()
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Forget `name` if the map holds its only reference.
    fn prune(&self, name: &str) {
        let mut locks = self.locks();
        if locks
            .get(name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks().len()
    }
}

/// Holds a name's mutex and prunes the entry once released.
struct LocalGrant {
    guard: Option<OwnedMutexGuard<()>>,
    name: String,
    manager: LocalLockManager,
}

impl Drop for LocalGrant {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.manager.prune(&self.name);
    }
}

#[async_trait]
impl NativeExclusiveLock for LocalLockManager {
    async fn request(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<NativeGrant, NativeLockError> {
        let lock = self.lock_for(name);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NativeLockError::Aborted),
            guard = lock.lock_owned() => Ok(guard),
        };

        match result {
            Ok(guard) => Ok(NativeGrant::new(LocalGrant {
                guard: Some(guard),
                name: name.to_string(),
                manager: self.clone(),
            })),
            Err(e) => {
                self.prune(name);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_grants_a_free_lock() {
        let manager = LocalLockManager::new();
        let grant = manager.request("a", CancellationToken::new()).await;
        assert!(grant.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_waits_until_grant_is_dropped() {
        let manager = LocalLockManager::new();
        let first = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.request("a", CancellationToken::new()).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_different_names_do_not_contend() {
        let manager = LocalLockManager::new();
        let _a = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();
        let b = manager.request("b", CancellationToken::new()).await;
        assert!(b.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_a_pending_request() {
        let manager = LocalLockManager::new();
        let _held = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();

        let token = CancellationToken::new();
        let waiter = {
            let manager = manager.clone();
            let token = token.clone();
            tokio::spawn(async move { manager.request("a", token).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(NativeLockError::Aborted)));
    }

    #[tokio::test]
    async fn test_released_names_are_forgotten() {
        let manager = LocalLockManager::new();
        let grant = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(manager.tracked(), 1);

        drop(grant);
        assert_eq!(manager.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_name_is_kept_while_a_waiter_remains() {
        let manager = LocalLockManager::new();
        let first = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.request("a", CancellationToken::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        drop(first);
        assert_eq!(manager.tracked(), 1);

        let second = waiter.await.unwrap().unwrap();
        drop(second);
        assert_eq!(manager.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_does_not_pin_the_name() {
        let manager = LocalLockManager::new();
        let held = manager
            .request("a", CancellationToken::new())
            .await
            .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = manager.request("a", token).await;
        assert!(matches!(result, Err(NativeLockError::Aborted)));

        drop(held);
        assert_eq!(manager.tracked(), 0);
    }
}
