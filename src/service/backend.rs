//! Backends a mutex can run on, and how they are ranked.

use crate::engine::Medium;
use crate::native::NativeExclusiveLock;
use crate::store::{KeyValueStore, persistent_key, session_key};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Kind of backend, ordered best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendKind {
    NativeLock,
    PersistentStorage,
    SessionStorage,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::NativeLock => "native lock",
            BackendKind::PersistentStorage => "persistent storage",
            BackendKind::SessionStorage => "session storage",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A usable backend together with the primitive or medium behind it.
#[derive(Debug, Clone)]
pub enum Backend {
    NativeLock(Arc<dyn NativeExclusiveLock>),
    PersistentStorage(Arc<dyn KeyValueStore>),
    SessionStorage(Arc<dyn KeyValueStore>),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::NativeLock(_) => BackendKind::NativeLock,
            Backend::PersistentStorage(_) => BackendKind::PersistentStorage,
            Backend::SessionStorage(_) => BackendKind::SessionStorage,
        }
    }

    /// Where a request for `name` keeps its exclusivity on this backend.
    pub(crate) fn medium(&self, name: &str) -> Medium {
        match self {
            Backend::NativeLock(_) => Medium::Native {
                cancel: CancellationToken::new(),
            },
            Backend::PersistentStorage(store) => Medium::Store {
                store: Arc::clone(store),
                key: persistent_key(name),
            },
            Backend::SessionStorage(store) => Medium::Store {
                store: Arc::clone(store),
                key: session_key(name),
            },
        }
    }
}

/// Capability detection: the backends usable right now, best first.
pub trait CapabilityProbe: Send + Sync {
    fn ranked_available_backends(&self) -> Vec<Backend>;
}

/// A fixed list of backends. Ranking is applied at selection time.
impl CapabilityProbe for Vec<Backend> {
    fn ranked_available_backends(&self) -> Vec<Backend> {
        let mut backends = self.clone();
        backends.sort_by_key(Backend::kind);
        backends
    }
}
