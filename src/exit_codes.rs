//! Exit code constants for the kvmutex CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: No usable backend
//! - 3: Lock could not be acquired (timeout, released early)
//! - 4: Storage or native-lock failure
//!
//! `kvmutex run` exits with the wrapped command's own code once the lock is held.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// No backend could be selected.
pub const CAPABILITY_UNAVAILABLE: i32 = 2;

/// The lock was not acquired.
pub const ACQUISITION_FAILURE: i32 = 3;

/// The shared medium or native primitive failed.
pub const STORAGE_FAILURE: i32 = 4;
