//! Error types for kvmutex.
//!
//! Uses thiserror for derive macros. Only capability absence, timeouts and
//! setup problems ever reach a caller; medium failures are absorbed by the
//! engine and show up here only when the CLI touches a store directly.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for kvmutex operations.
#[derive(Error, Debug)]
pub enum MutexError {
    /// No backend is usable in the current environment.
    #[error("no usable mutex backend: {0}")]
    CapabilityUnavailable(String),

    /// Acquisition did not succeed before the configured timeout.
    #[error("timed out after {waited:?} waiting for mutex '{name}'")]
    AcquisitionTimeout { name: String, waited: Duration },

    /// The holder kept the lock past its expiry and it was auto-released.
    #[error("mutex '{0}' expired before it was released")]
    LeaseExpired(String),

    /// A lease record could not be decoded. Recovered locally as a vacant record.
    #[error("malformed lease record: {0}")]
    MalformedRecord(String),

    /// The request ended without acquiring, for a reason other than a timeout.
    #[error("mutex '{name}' was not acquired: {reason}")]
    NotAcquired { name: String, reason: String },

    /// The shared medium could not be read or written.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The native exclusive-lock primitive failed.
    #[error("native lock failure: {0}")]
    NativeLock(String),

    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(String),

    /// The command line asked for something that cannot be done.
    #[error("{0}")]
    UserError(String),

    /// `acquire` was called outside a tokio runtime.
    #[error("mutex acquisition requires a running tokio runtime")]
    NoRuntime,
}

impl MutexError {
    /// Returns the process exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            MutexError::Config(_) | MutexError::UserError(_) | MutexError::NoRuntime => {
                exit_codes::USER_ERROR
            }
            MutexError::CapabilityUnavailable(_) => exit_codes::CAPABILITY_UNAVAILABLE,
            MutexError::AcquisitionTimeout { .. }
            | MutexError::LeaseExpired(_)
            | MutexError::NotAcquired { .. } => exit_codes::ACQUISITION_FAILURE,
            MutexError::MalformedRecord(_)
            | MutexError::Storage(_)
            | MutexError::NativeLock(_) => exit_codes::STORAGE_FAILURE,
        }
    }
}

/// Result type alias for kvmutex operations.
pub type Result<T> = std::result::Result<T, MutexError>;
