//! Caller-facing handle, options and acquisition future.
//!
//! [`MutexService::acquire`](crate::MutexService::acquire) returns a
//! [`PendingAcquire`]. Awaiting it yields the [`MutexHandle`] once the lock is
//! held, or a [`Rejection`] when the request timed out or was abandoned.
//!
//! # Lifecycle callbacks
//!
//! - `on_acquire` fires when the lock is granted, before the future resolves.
//! - `on_timeout` fires when acquisition gives up, before the future rejects.
//! - `on_expire` fires when the lock was held past `expires` and auto-released.
//! - `on_complete` fires exactly once per request, after every other callback,
//!   whichever way the request ends.
//!
//! Callbacks run outside the request's internal lock, so they may call
//! [`MutexHandle::release`] on the handle they receive.
//!
//! Dropping a handle does **not** release the lock. Call
//! [`MutexHandle::release`], or set an expiry as a safety net. Dropping a
//! [`PendingAcquire`] before it resolves does release: the request is
//! abandoned, so wrapping it in `tokio::time::timeout` never leaks a lock.

use crate::engine::{MutexState, Outcome, RequestCore};
use crate::error::{MutexError, Result};
use crate::lease::HolderId;
use crate::service::BackendKind;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// A lifecycle callback.
pub type Callback = Box<dyn FnOnce(&MutexHandle) + Send + 'static>;

#[derive(Default)]
pub(crate) struct Callbacks {
    pub on_acquire: Option<Callback>,
    pub on_complete: Option<Callback>,
    pub on_timeout: Option<Callback>,
    pub on_expire: Option<Callback>,
}

/// Options for one acquisition.
#[derive(Default)]
pub struct AcquireOptions {
    /// Give up after this long. Zero waits forever.
    pub timeout: Duration,

    /// Auto-release this long after acquiring. Zero never expires.
    pub expires: Duration,

    pub(crate) callbacks: Callbacks,
}

impl AcquireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn expires(mut self, expires: Duration) -> Self {
        self.expires = expires;
        self
    }

    pub fn on_acquire(mut self, f: impl FnOnce(&MutexHandle) + Send + 'static) -> Self {
        self.callbacks.on_acquire = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(&MutexHandle) + Send + 'static) -> Self {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_timeout(mut self, f: impl FnOnce(&MutexHandle) + Send + 'static) -> Self {
        self.callbacks.on_timeout = Some(Box::new(f));
        self
    }

    pub fn on_expire(mut self, f: impl FnOnce(&MutexHandle) + Send + 'static) -> Self {
        self.callbacks.on_expire = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for AcquireOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquireOptions")
            .field("timeout", &self.timeout)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

/// Shared view of one acquisition request.
#[derive(Clone)]
pub struct MutexHandle {
    pub(crate) core: Arc<RequestCore>,
}

impl MutexHandle {
    pub(crate) fn new(core: Arc<RequestCore>) -> Self {
        Self { core }
    }

    /// Lock name this request is for.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Identifier this request writes into lease records.
    pub fn holder_id(&self) -> &HolderId {
        self.core.holder_id()
    }

    /// Backend driving this request.
    pub fn backend(&self) -> BackendKind {
        self.core.backend()
    }

    /// Whether the lock is currently held by this request.
    pub fn locked(&self) -> bool {
        self.core.state().is_locked()
    }

    pub fn state(&self) -> MutexState {
        self.core.state()
    }

    /// How the request ended, once it has.
    pub fn outcome(&self) -> Option<Outcome> {
        self.core.outcome()
    }

    /// Release the lock, or abandon the request if it is still waiting.
    ///
    /// Stops every timer, clears the lease if it is ours, and fires
    /// `on_complete`. Calling it again, or after a timeout or expiry, does
    /// nothing.
    pub fn release(&self) {
        self.core.release();
    }

    /// Check that the lock is still held by this request.
    ///
    /// Returns [`MutexError::LeaseExpired`] once the lock was auto-released at
    /// its expiry, and [`MutexError::NotAcquired`] for any other state.
    pub fn ensure_held(&self) -> Result<()> {
        let state = self.state();
        if state.is_locked() {
            return Ok(());
        }

        let name = self.name().to_string();
        match self.outcome() {
            Some(Outcome::Expired) => Err(MutexError::LeaseExpired(name)),
            Some(outcome) => Err(MutexError::NotAcquired {
                name,
                reason: outcome.to_string(),
            }),
            None => Err(MutexError::NotAcquired {
                name,
                reason: format!("request is {}", state),
            }),
        }
    }
}

impl fmt::Debug for MutexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexHandle")
            .field("name", &self.name())
            .field("holder_id", self.holder_id())
            .field("backend", &self.backend())
            .field("state", &self.state())
            .finish()
    }
}

/// Why a request settled without the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The timeout passed before the lock was granted.
    Timeout,
    /// The caller released the request before the lock was granted.
    Released,
    /// The native primitive reported an error.
    Native(String),
    /// The request's driver went away.
    Failed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Timeout => write!(f, "timeout"),
            RejectReason::Released => write!(f, "released"),
            RejectReason::Native(reason) => write!(f, "native lock failed: {}", reason),
            RejectReason::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// A request that settled without the lock.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub handle: MutexHandle,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutex '{}' not acquired: {}", self.handle.name(), self.reason)
    }
}

impl std::error::Error for Rejection {}

impl From<Rejection> for MutexError {
    fn from(rejection: Rejection) -> Self {
        let name = rejection.handle.name().to_string();
        match rejection.reason {
            RejectReason::Timeout => MutexError::AcquisitionTimeout {
                name,
                waited: rejection.handle.core.timeout(),
            },
            RejectReason::Native(reason) => MutexError::NativeLock(reason),
            reason => MutexError::NotAcquired {
                name,
                reason: reason.to_string(),
            },
        }
    }
}

pub(crate) type Settlement = std::result::Result<(), RejectReason>;

/// Future of an acquisition in progress.
///
/// Dropping it before it resolves releases the request.
pub struct PendingAcquire {
    handle: MutexHandle,
    settled: oneshot::Receiver<Settlement>,
    resolved: bool,
}

impl PendingAcquire {
    pub(crate) fn new(handle: MutexHandle, settled: oneshot::Receiver<Settlement>) -> Self {
        Self {
            handle,
            settled,
            resolved: false,
        }
    }

    /// The handle, available before the request settles.
    pub fn handle(&self) -> &MutexHandle {
        &self.handle
    }
}

impl Future for PendingAcquire {
    type Output = std::result::Result<MutexHandle, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let settlement = match Pin::new(&mut self.settled).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(settlement)) => settlement,
            Poll::Ready(Err(_)) => Err(RejectReason::Failed(
                "request driver stopped before settling".to_string(),
            )),
        };

        self.resolved = true;
        let handle = self.handle.clone();
        Poll::Ready(match settlement {
            Ok(()) => Ok(handle),
            Err(reason) => Err(Rejection { handle, reason }),
        })
    }
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if !self.resolved {
            self.handle.release();
        }
    }
}

impl fmt::Debug for PendingAcquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAcquire")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
