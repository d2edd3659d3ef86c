use crate::error::Result;
use crate::handle::AcquireOptions;
use crate::lease::LeaseRecord;
use crate::service::{Backend, MutexService};
use crate::store::{KeyValueStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Counts how often each lifecycle callback fired.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallbackCounts {
    acquired: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    timed_out: Arc<AtomicUsize>,
    expired: Arc<AtomicUsize>,
}

impl CallbackCounts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Options with all four callbacks wired to these counters.
    pub(crate) fn options(&self) -> AcquireOptions {
        let acquired = Arc::clone(&self.acquired);
        let completed = Arc::clone(&self.completed);
        let timed_out = Arc::clone(&self.timed_out);
        let expired = Arc::clone(&self.expired);
        AcquireOptions::new()
            .on_acquire(move |_| {
                acquired.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move |_| {
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .on_timeout(move |_| {
                timed_out.fetch_add(1, Ordering::SeqCst);
            })
            .on_expire(move |_| {
                expired.fetch_add(1, Ordering::SeqCst);
            })
    }

    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn timed_out(&self) -> usize {
        self.timed_out.load(Ordering::SeqCst)
    }

    pub(crate) fn expired(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }
}

/// Memory store that remembers every write.
#[derive(Debug, Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<(String, LeaseRecord)>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn writes(&self) -> Vec<(String, LeaseRecord)> {
        self.writes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> LeaseRecord {
        self.inner.get(key)
    }

    fn set(&self, key: &str, record: &LeaseRecord) -> Result<()> {
        self.writes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push((key.to_string(), record.clone()));
        self.inner.set(key, record)
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.inner.clear(key)
    }
}

/// A service backed only by session storage in `store`.
///
/// Build it inside the test runtime so the system clock follows paused time.
pub(crate) fn session_service(store: Arc<dyn KeyValueStore>) -> MutexService {
    MutexService::new(vec![Backend::SessionStorage(store)])
}
