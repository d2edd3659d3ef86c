//! Implementation of the `kvmutex backends` command.

use kvmutex::config::MutexConfig;
use kvmutex::error::{MutexError, Result};
use kvmutex::service::BackendKind;
use kvmutex::MutexService;

pub fn cmd_backends(config: &MutexConfig) -> Result<()> {
    let kinds = available_kinds(config)?;

    println!("Available backends (best first):");
    for (rank, kind) in kinds.iter().enumerate() {
        let marker = if rank == 0 { "  (selected)" } else { "" };
        println!("  {}. {}{}", rank + 1, kind, marker);
    }
    Ok(())
}

/// Backends usable under `config`, best first.
pub fn available_kinds(config: &MutexConfig) -> Result<Vec<BackendKind>> {
    let service = MutexService::from_config(config);
    let kinds: Vec<BackendKind> = service.backends().iter().map(|b| b.kind()).collect();

    if kinds.is_empty() {
        return Err(MutexError::CapabilityUnavailable(
            "every backend is disabled or unusable; check native_lock, \
             enable_persistent_store and enable_session_store"
                .to_string(),
        ));
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvmutex::config::NativeLockKind;
    use tempfile::TempDir;

    #[test]
    fn test_lists_backends_in_rank_order() {
        let dir = TempDir::new().unwrap();
        let config = MutexConfig {
            store_dir: dir.path().to_path_buf(),
            native_lock: NativeLockKind::Local,
            ..MutexConfig::default()
        };

        assert_eq!(
            available_kinds(&config).unwrap(),
            vec![
                BackendKind::NativeLock,
                BackendKind::PersistentStorage,
                BackendKind::SessionStorage,
            ]
        );
    }

    #[test]
    fn test_nothing_enabled_is_capability_error() {
        let dir = TempDir::new().unwrap();
        let config = MutexConfig {
            store_dir: dir.path().to_path_buf(),
            native_lock: NativeLockKind::Disabled,
            enable_persistent_store: false,
            enable_session_store: false,
            ..MutexConfig::default()
        };

        let err = available_kinds(&config).unwrap_err();
        assert_eq!(err.exit_code(), kvmutex::exit_codes::CAPABILITY_UNAVAILABLE);
    }
}
