//! Native-primitive driver: wait for the grant, cancel on timeout.

use super::{DriverGuard, Medium, RequestCore};
use crate::handle::RejectReason;
use crate::native::{NativeExclusiveLock, NativeGrant, NativeLockError};
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};

/// Wait for the native lock, cancelling the wait once the timeout passes.
pub(crate) async fn drive_acquire(core: Arc<RequestCore>, lock: Arc<dyn NativeExclusiveLock>) {
    let Medium::Native { cancel } = &core.medium else {
        return;
    };
    let cancel = cancel.clone();
    let _guard = DriverGuard::acquiring(&core);

    let request = lock.request(&core.name, cancel.clone());
    tokio::pin!(request);

    let mut watchdog = interval(core.timing.native_poll_interval);
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            result = &mut request => break result,
            _ = watchdog.tick(), if !cancel.is_cancelled() => {
                if core.timeout_elapsed(core.clock.now_ms()) {
                    tracing::debug!(name = %core.name, "native lock wait timed out, cancelling");
                    cancel.cancel();
                }
            }
        }
    };

    match result {
        Ok(grant) => core.granted(grant),
        Err(NativeLockError::Aborted) => core.time_out(),
        Err(e) => core.fail(RejectReason::Native(e.to_string())),
    }
}

impl RequestCore {
    /// The native primitive granted the lock.
    fn granted(self: &Arc<Self>, grant: NativeGrant) {
        let mut inner = self.inner();
        if !inner.state.is_acquiring() {
            tracing::debug!(name = %self.name, "dropping grant for a finished request");
            return;
        }

        inner.grant = Some(grant);
        let deferred = self.enter_locked(&mut inner, self.clock.now_ms());
        drop(inner);
        deferred.run(&self.handle());
    }
}
