//! Implementation of the `kvmutex status` command.

use crate::cli::StatusArgs;
use globset::{Glob, GlobMatcher};
use kvmutex::config::MutexConfig;
use kvmutex::error::{MutexError, Result};
use kvmutex::store::{FileStore, PERSISTENT_PREFIX};
use kvmutex::LeaseRecord;
use std::fmt;

/// One lease record as shown to an operator.
#[derive(Debug, Clone)]
pub struct LeaseInfo {
    /// The mutex name (storage key without its prefix).
    pub name: String,

    pub record: LeaseRecord,

    /// Age rendered for humans.
    pub age: String,

    /// Whether anyone may claim the record right now.
    pub is_stale: bool,
}

impl fmt::Display for LeaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let holder = if self.record.holder_id.is_empty() {
            "none"
        } else {
            self.record.holder_id.as_str()
        };
        write!(
            f,
            "{} (holder: {}, owner: {}, age: {}{})",
            self.name,
            holder,
            self.record.owner.as_deref().unwrap_or("unknown"),
            self.age,
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}

pub fn cmd_status(config: &MutexConfig, args: StatusArgs) -> Result<()> {
    let store = FileStore::open(config.records_dir())?;
    let now = chrono::Utc::now().timestamp_millis();
    let leases = collect_leases(&store, args.pattern.as_deref(), now, config.timing().oldest_touch_ms())?;

    if leases.is_empty() {
        println!("No lease records.");
        return Ok(());
    }

    println!("Lease records ({}):", leases.len());
    println!();
    for lease in &leases {
        println!("  {}", lease);
    }

    let stale_count = leases.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        println!();
        println!(
            "Note: {} record(s) are stale and will be reclaimed by the next waiter.",
            stale_count
        );
    }

    Ok(())
}

/// Persistent records whose name matches `pattern`, sorted by name.
pub fn collect_leases(
    store: &FileStore,
    pattern: Option<&str>,
    now: i64,
    oldest_touch_ms: i64,
) -> Result<Vec<LeaseInfo>> {
    let matcher = pattern.map(compile_pattern).transpose()?;

    let leases = store
        .entries()?
        .into_iter()
        .filter_map(|(key, record)| {
            let name = key.strip_prefix(PERSISTENT_PREFIX)?.to_string();
            if let Some(matcher) = &matcher
                && !matcher.is_match(&name)
            {
                return None;
            }
            Some(LeaseInfo {
                age: record.age_string(now),
                is_stale: record.is_stale(now, oldest_touch_ms),
                name,
                record,
            })
        })
        .collect();

    Ok(leases)
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| MutexError::UserError(format!("invalid name pattern '{}': {}", pattern, e)))
}
