//! Acquisition engines.
//!
//! Every call to `acquire` creates one [`RequestCore`]: the request's
//! identity, its medium, and its lifecycle state behind a mutex. Two drivers
//! move a request through its states:
//!
//! - [`storage`]: polls a key-value store, claims vacant or stale records,
//!   confirms them on the next read, then heartbeats while locked.
//! - [`native`]: waits on a native exclusive lock, with a watchdog that cancels
//!   the wait once the timeout passes.
//!
//! Both drivers share the transitions defined here, so the caller-facing
//! contract is identical: `on_acquire` on success, `on_timeout` on timeout,
//! `on_expire` on expiry, and `on_complete` exactly once at the end.

pub(crate) mod native;
pub mod protocol;
mod state;
pub(crate) mod storage;


pub use protocol::{TickDecision, decide};
pub use state::{AcquirePhase, MutexState, Outcome};

use crate::handle::{AcquireOptions, Callback, Callbacks, MutexHandle, RejectReason, Settlement};
use crate::lease::{Clock, HolderId, LeaseRecord, Timing};
use crate::native::NativeGrant;
use crate::service::BackendKind;
use crate::store::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

/// Where a request's exclusivity lives.
#[derive(Debug)]
pub(crate) enum Medium {
    Store {
        store: Arc<dyn KeyValueStore>,
        key: String,
    },
    Native {
        cancel: CancellationToken,
    },
}

/// Background tasks owned by a request.
#[derive(Debug, Default)]
struct Timers {
    poll: Option<AbortHandle>,
    heartbeat: Option<AbortHandle>,
    expiry: Option<AbortHandle>,
}

impl Timers {
    fn stop_all(&mut self) {
        for timer in [self.poll.take(), self.heartbeat.take(), self.expiry.take()]
            .into_iter()
            .flatten()
        {
            timer.abort();
        }
    }
}

struct RequestInner {
    state: MutexState,
    outcome: Option<Outcome>,
    last_touch: i64,
    callbacks: Callbacks,
    settle: Option<oneshot::Sender<Settlement>>,
    timers: Timers,
    grant: Option<NativeGrant>,
}

/// Work collected under the request lock and run after it is dropped.
#[derive(Default)]
#[must_use]
struct Deferred {
    steps: Vec<Step>,
}

enum Step {
    Call(Callback),
    Settle(oneshot::Sender<Settlement>, Settlement),
}

impl Deferred {
    fn call(&mut self, callback: Option<Callback>) {
        if let Some(callback) = callback {
            self.steps.push(Step::Call(callback));
        }
    }

    fn settle(&mut self, sender: Option<oneshot::Sender<Settlement>>, settlement: Settlement) {
        if let Some(sender) = sender {
            self.steps.push(Step::Settle(sender, settlement));
        }
    }

    fn run(self, handle: &MutexHandle) {
        for step in self.steps {
            match step {
                Step::Call(callback) => callback(handle),
                Step::Settle(sender, settlement) => {
                    // The caller may have dropped the future; nothing to do then.
                    let _ = sender.send(settlement);
                }
            }
        }
    }
}

/// Fails its request if the driver task stops while still responsible for it.
///
/// A driver that panics or is dropped by a shutting-down runtime would
/// otherwise leave its caller waiting forever.
pub(crate) struct DriverGuard {
    core: Arc<RequestCore>,
    while_locked: bool,
}

impl DriverGuard {
    /// Guard for a driver that runs while the request is acquiring.
    pub(crate) fn acquiring(core: &Arc<RequestCore>) -> Self {
        Self {
            core: Arc::clone(core),
            while_locked: false,
        }
    }

    /// Guard for a driver that runs while the lock is held.
    pub(crate) fn holding(core: &Arc<RequestCore>) -> Self {
        Self {
            core: Arc::clone(core),
            while_locked: true,
        }
    }
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        let state = self.core.state();
        let orphaned = if self.while_locked {
            state.is_locked()
        } else {
            state.is_acquiring()
        };
        if orphaned {
            self.core
                .fail(RejectReason::Failed("request driver stopped".to_string()));
        }
    }
}

/// One acquisition request and its lifecycle.
pub(crate) struct RequestCore {
    name: String,
    holder_id: HolderId,
    backend: BackendKind,
    medium: Medium,
    timing: Timing,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    expires: Duration,
    owner: Option<String>,
    started_at: i64,
    inner: Mutex<RequestInner>,
}

/// Everything needed to build a request.
pub(crate) struct RequestParams {
    pub name: String,
    pub backend: BackendKind,
    pub medium: Medium,
    pub timing: Timing,
    pub clock: Arc<dyn Clock>,
    pub owner: Option<String>,
}

impl RequestCore {
    pub(crate) fn new(
        params: RequestParams,
        options: AcquireOptions,
    ) -> (Arc<Self>, oneshot::Receiver<Settlement>) {
        let (settle, settled) = oneshot::channel();
        let started_at = params.clock.now_ms();
        let core = Arc::new(Self {
            name: params.name,
            holder_id: HolderId::generate(),
            backend: params.backend,
            medium: params.medium,
            timing: params.timing,
            clock: params.clock,
            timeout: options.timeout,
            expires: options.expires,
            owner: params.owner,
            started_at,
            inner: Mutex::new(RequestInner {
                state: MutexState::Idle,
                outcome: None,
                last_touch: 0,
                callbacks: options.callbacks,
                settle: Some(settle),
                timers: Timers::default(),
                grant: None,
            }),
        });
        (core, settled)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn holder_id(&self) -> &HolderId {
        &self.holder_id
    }

    pub(crate) fn backend(&self) -> BackendKind {
        self.backend
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn state(&self) -> MutexState {
        self.inner().state
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.inner().outcome
    }

    fn inner(&self) -> MutexGuard<'_, RequestInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn handle(self: &Arc<Self>) -> MutexHandle {
        MutexHandle::new(Arc::clone(self))
    }

    fn timeout_ms(&self) -> i64 {
        i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX)
    }

    /// Whether the timeout is enabled and has passed at `now`.
    fn timeout_elapsed(&self, now: i64) -> bool {
        let timeout_ms = self.timeout_ms();
        timeout_ms > 0 && now.saturating_sub(self.started_at) > timeout_ms
    }

    fn record_at(&self, at: i64) -> LeaseRecord {
        LeaseRecord::held_by(&self.holder_id, at).with_owner(self.owner.clone())
    }

    /// Move from `Idle` to `Acquiring`.
    pub(crate) fn begin(&self) {
        let mut inner = self.inner();
        if inner.state == MutexState::Idle {
            inner.state = MutexState::Acquiring(AcquirePhase::Claiming);
        }
    }

    /// Remember the task driving acquisition so a release can stop it.
    pub(crate) fn track_driver(&self, driver: AbortHandle) {
        let mut inner = self.inner();
        // A driver that already settled the request has nothing left to stop.
        if inner.state.is_acquiring() {
            inner.timers.poll = Some(driver);
        }
    }

    /// Transition to `Locked` and start the lock's timers.
    fn enter_locked(self: &Arc<Self>, inner: &mut RequestInner, touched_at: i64) -> Deferred {
        inner.state = MutexState::Locked;
        inner.last_touch = touched_at;
        inner.timers.poll = None;

        if matches!(self.medium, Medium::Store { .. }) {
            let core = Arc::clone(self);
            inner.timers.heartbeat =
                Some(tokio::spawn(storage::drive_heartbeat(core)).abort_handle());
        }

        if !self.expires.is_zero() {
            let core = Arc::clone(self);
            let expires = self.expires;
            inner.timers.expiry = Some(
                tokio::spawn(async move {
                    tokio::time::sleep(expires).await;
                    core.expire();
                })
                .abort_handle(),
            );
        }

        tracing::info!(
            name = %self.name,
            holder = %self.holder_id,
            backend = %self.backend,
            "mutex acquired"
        );

        let mut deferred = Deferred::default();
        deferred.call(inner.callbacks.on_acquire.take());
        deferred.settle(inner.settle.take(), Ok(()));
        deferred
    }

    /// Stop every timer and give back whatever we hold on the medium.
    fn relinquish(&self, inner: &mut RequestInner) {
        inner.timers.stop_all();

        match &self.medium {
            Medium::Store { store, key } => {
                if store.get(key).is_held_by(&self.holder_id)
                    && let Err(e) = store.clear(key)
                {
                    tracing::warn!(name = %self.name, error = %e, "failed to clear lease record");
                }
            }
            Medium::Native { cancel } => {
                cancel.cancel();
                inner.grant = None;
            }
        }
    }

    /// Mark the request completed and fire `on_complete`, once.
    fn finish(self: &Arc<Self>, outcome: Outcome) {
        let deferred = {
            let mut inner = self.inner();
            if inner.state == MutexState::Completed {
                return;
            }
            inner.state = MutexState::Completed;
            inner.outcome.get_or_insert(outcome);

            let mut deferred = Deferred::default();
            deferred.call(inner.callbacks.on_complete.take());
            deferred
        };
        deferred.run(&self.handle());
    }

    /// Give up waiting: `on_timeout`, reject, then `on_complete`.
    pub(crate) fn time_out(self: &Arc<Self>) {
        let deferred = {
            let mut inner = self.inner();
            if !inner.state.is_acquiring() {
                return;
            }
            inner.state = MutexState::TimedOut;
            inner.outcome = Some(Outcome::TimedOut);
            self.relinquish(&mut inner);

            tracing::info!(name = %self.name, holder = %self.holder_id, "mutex acquisition timed out");

            let mut deferred = Deferred::default();
            deferred.call(inner.callbacks.on_timeout.take());
            deferred.settle(inner.settle.take(), Err(RejectReason::Timeout));
            deferred
        };
        deferred.run(&self.handle());
        self.finish(Outcome::TimedOut);
    }

    /// Abandon a request whose backend or driver failed.
    ///
    /// Applies while acquiring or locked. A waiting caller is rejected with
    /// `reason`; a holder simply loses the lock. `on_complete` fires either way.
    pub(crate) fn fail(self: &Arc<Self>, reason: RejectReason) {
        let deferred = {
            let mut inner = self.inner();
            if !inner.state.is_acquiring() && !inner.state.is_locked() {
                return;
            }
            inner.state = MutexState::Releasing;
            inner.outcome = Some(Outcome::Failed);
            self.relinquish(&mut inner);

            tracing::warn!(name = %self.name, holder = %self.holder_id, reason = %reason, "mutex request failed");

            let mut deferred = Deferred::default();
            deferred.settle(inner.settle.take(), Err(reason));
            deferred
        };
        deferred.run(&self.handle());
        self.finish(Outcome::Failed);
    }

    /// Auto-release a lock held past its expiry: `on_expire`, then `on_complete`.
    pub(crate) fn expire(self: &Arc<Self>) {
        let deferred = {
            let mut inner = self.inner();
            if !inner.state.is_locked() {
                return;
            }
            inner.state = MutexState::Expired;
            inner.outcome = Some(Outcome::Expired);
            self.relinquish(&mut inner);

            tracing::warn!(
                name = %self.name,
                holder = %self.holder_id,
                expires = ?self.expires,
                "mutex held past expiry, auto-released"
            );

            let mut deferred = Deferred::default();
            deferred.call(inner.callbacks.on_expire.take());
            deferred
        };
        deferred.run(&self.handle());
        self.finish(Outcome::Expired);
    }

    /// Release the lock or abandon the wait.
    pub(crate) fn release(self: &Arc<Self>) {
        let deferred = {
            let mut inner = self.inner();
            if inner.state.is_finishing() {
                return;
            }
            let was_locked = inner.state.is_locked();
            inner.state = MutexState::Releasing;
            inner.outcome = Some(Outcome::Released);
            self.relinquish(&mut inner);

            if was_locked {
                tracing::info!(name = %self.name, holder = %self.holder_id, "mutex released");
            } else {
                tracing::debug!(name = %self.name, holder = %self.holder_id, "request released before acquiring");
            }

            let mut deferred = Deferred::default();
            deferred.settle(inner.settle.take(), Err(RejectReason::Released));
            deferred
        };
        deferred.run(&self.handle());
        self.finish(Outcome::Released);
    }
}
