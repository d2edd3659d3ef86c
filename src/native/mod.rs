//! Native exclusive-lock primitives.
//!
//! When the environment offers a real exclusive lock, the mutex uses it
//! instead of the storage protocol. The primitive owns liveness: a grant is
//! held until it is dropped, and a crashed holder's grant is released by the
//! primitive itself.
//!
//! Two primitives ship with the crate:
//! - [`LocalLockManager`]: named locks shared by every request in the process.
//! - [`FileLockManager`]: OS advisory locks on files in a shared directory,
//!   exclusive across processes on the host.

mod file;
mod local;

pub use file::FileLockManager;
pub use local::LocalLockManager;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from a native lock request.
#[derive(Error, Debug)]
pub enum NativeLockError {
    /// The request was cancelled before the lock was granted.
    #[error("lock request aborted")]
    Aborted,

    /// The primitive itself failed.
    #[error("{0}")]
    Io(String),
}

/// Proof of an exclusive hold. Dropping it releases the lock.
pub struct NativeGrant {
    _guard: Box<dyn Send>,
}

impl NativeGrant {
    pub fn new<G: Send + 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for NativeGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeGrant").finish_non_exhaustive()
    }
}

/// An environment-provided exclusive lock keyed by name.
#[async_trait]
pub trait NativeExclusiveLock: Send + Sync + fmt::Debug {
    /// Wait for an exclusive hold on `name`.
    ///
    /// Resolves with [`NativeLockError::Aborted`] once `cancel` fires, unless
    /// the lock was granted first.
    async fn request(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<NativeGrant, NativeLockError>;
}
