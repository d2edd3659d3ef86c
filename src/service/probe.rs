//! Capability detection driven by configuration.

use super::backend::{Backend, CapabilityProbe};
use crate::config::{MutexConfig, NativeLockKind};
use crate::native::{FileLockManager, LocalLockManager};
use crate::store::{FileStore, MemoryStore};
use std::sync::Arc;

/// Probes the environment once, honouring the config's enable switches.
///
/// A backend whose directory cannot be created or written is left out, so
/// selection falls through to the next one.
#[derive(Debug, Clone)]
pub struct ConfiguredProbe {
    backends: Vec<Backend>,
}

impl ConfiguredProbe {
    pub fn from_config(config: &MutexConfig) -> Self {
        let mut backends = Vec::new();

        match config.native_lock {
            NativeLockKind::File => match FileLockManager::open(config.native_dir()) {
                Ok(manager) => backends.push(Backend::NativeLock(Arc::new(manager))),
                Err(e) => {
                    tracing::debug!(error = %e, "file locks unavailable");
                }
            },
            NativeLockKind::Local => {
                backends.push(Backend::NativeLock(Arc::new(
                    LocalLockManager::process_wide(),
                )));
            }
            NativeLockKind::Disabled => {}
        }

        if config.enable_persistent_store {
            match FileStore::open(config.records_dir()) {
                Ok(store) => backends.push(Backend::PersistentStorage(Arc::new(store))),
                Err(e) => {
                    tracing::debug!(error = %e, "persistent storage unavailable");
                }
            }
        }

        if config.enable_session_store {
            backends.push(Backend::SessionStorage(Arc::new(
                MemoryStore::process_wide(),
            )));
        }

        Self { backends }
    }
}

impl CapabilityProbe for ConfiguredProbe {
    fn ranked_available_backends(&self) -> Vec<Backend> {
        self.backends.ranked_available_backends()
    }
}
