//! kvmutex: cooperative mutual exclusion over a shared key-value medium.
//!
//! Independent contexts that share nothing but a plain key-value store (no
//! compare-and-swap) coordinate through one lease record per lock name. A
//! holder proves liveness by rewriting the record every few milliseconds; a
//! record that stops being refreshed goes stale and can be claimed by anyone.
//! When the environment offers a native exclusive lock, it is used instead
//! and the caller sees the same contract.
//!
//! The crate is organised leaves first:
//! - [`lease`]: lease records, clocks and protocol timing
//! - [`store`]: the key-value media records live in
//! - [`native`]: native exclusive-lock primitives
//! - [`engine`]: the per-request state machine and its drivers
//! - [`service`]: backend selection and the `acquire` entry point
//! - [`handle`]: what callers hold while they wait and while they own a lock

pub mod config;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod handle;
pub mod lease;
pub mod native;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::MutexConfig;
pub use error::{MutexError, Result};
pub use handle::{AcquireOptions, MutexHandle, PendingAcquire, RejectReason, Rejection};
pub use lease::{HolderId, LeaseRecord};
pub use service::{Backend, BackendKind, CapabilityProbe, ConfiguredProbe, MutexService};
