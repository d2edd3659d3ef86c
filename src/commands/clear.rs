//! Implementation of the `kvmutex clear` command.

use crate::cli::ClearArgs;
use kvmutex::config::MutexConfig;
use kvmutex::error::{MutexError, Result};
use kvmutex::store::{FileStore, KeyValueStore, persistent_key};

pub fn cmd_clear(config: &MutexConfig, args: ClearArgs) -> Result<()> {
    if !args.force {
        return Err(MutexError::UserError(format!(
            "refusing to clear mutex '{}' without --force flag.\n\n\
             Clearing a live record lets a second holder in while the first still runs.\n\
             Only clear records whose holder you know has crashed.\n\n\
             To clear the record, run:\n  kvmutex clear {} --force",
            args.name, args.name
        )));
    }

    let store = FileStore::open(config.records_dir())?;
    let previous = clear_record(&store, &args.name)?;

    if previous.holder_id.is_empty() {
        println!("Cleared lease record for mutex '{}'.", args.name);
    } else {
        println!(
            "Cleared lease record for mutex '{}' (was held by {}, owner: {}).",
            args.name,
            previous.holder_id,
            previous.owner.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

/// Delete the persistent record for `name`, returning what it held.
pub fn clear_record(store: &FileStore, name: &str) -> Result<kvmutex::LeaseRecord> {
    let key = persistent_key(name);
    if !store.record_path(&key).exists() {
        return Err(MutexError::UserError(format!(
            "no lease record for mutex '{}'",
            name
        )));
    }

    let previous = store.get(&key);
    store.clear(&key)?;
    tracing::info!(name = %name, holder = %previous.holder_id, "lease record cleared by operator");
    Ok(previous)
}
