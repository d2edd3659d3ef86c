//! Storage-medium driver: poll, claim, confirm, heartbeat.

use super::protocol::{TickDecision, decide};
use super::{AcquirePhase, DriverGuard, Medium, MutexState, RequestCore};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};

/// Poll the store every `acquire_interval` until the request leaves `Acquiring`.
pub(crate) async fn drive_acquire(core: Arc<RequestCore>) {
    let _guard = DriverGuard::acquiring(&core);
    let mut ticker = interval(core.timing.acquire_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if core.poll_tick().is_break() {
            break;
        }
    }
}

/// Re-assert the lease every `touch_interval` while the request is `Locked`.
pub(crate) async fn drive_heartbeat(core: Arc<RequestCore>) {
    let _guard = DriverGuard::holding(&core);
    let period = core.timing.touch_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if core.heartbeat().is_break() {
            break;
        }
    }
}

impl RequestCore {
    /// One acquisition tick.
    pub(crate) fn poll_tick(self: &Arc<Self>) -> ControlFlow<()> {
        let Medium::Store { store, key } = &self.medium else {
            return ControlFlow::Break(());
        };

        let mut inner = self.inner();
        let phase = match inner.state {
            MutexState::Idle => AcquirePhase::Claiming,
            MutexState::Acquiring(phase) => phase,
            _ => return ControlFlow::Break(()),
        };

        let now = self.clock.now_ms();
        let record = store.get(key);
        let decision = decide(
            &self.holder_id,
            &record,
            now,
            self.started_at,
            self.timeout_ms(),
            self.timing.oldest_touch_ms(),
        );

        match decision {
            TickDecision::Confirm => {
                let deferred = self.enter_locked(&mut inner, record.last_touch);
                drop(inner);
                deferred.run(&self.handle());
                ControlFlow::Break(())
            }
            TickDecision::Claim => {
                tracing::debug!(
                    name = %self.name,
                    holder = %self.holder_id,
                    previous = %record.holder_id,
                    "claiming vacant or stale lease"
                );
                if let Err(e) = store.set(key, &self.record_at(now)) {
                    tracing::warn!(name = %self.name, error = %e, "failed to write lease claim");
                }
                inner.state = MutexState::Acquiring(AcquirePhase::Confirming);
                ControlFlow::Continue(())
            }
            TickDecision::Wait => {
                if phase == AcquirePhase::Confirming {
                    tracing::debug!(
                        name = %self.name,
                        holder = %self.holder_id,
                        winner = %record.holder_id,
                        "lease claim overwritten"
                    );
                }
                inner.state = MutexState::Acquiring(AcquirePhase::Claiming);
                ControlFlow::Continue(())
            }
            TickDecision::GiveUp => {
                drop(inner);
                self.time_out();
                ControlFlow::Break(())
            }
        }
    }

    /// One heartbeat. Every write carries a strictly later `lastTouch`.
    pub(crate) fn heartbeat(&self) -> ControlFlow<()> {
        let Medium::Store { store, key } = &self.medium else {
            return ControlFlow::Break(());
        };

        let mut inner = self.inner();
        if !inner.state.is_locked() {
            return ControlFlow::Break(());
        }

        let touch = self.clock.now_ms().max(inner.last_touch.saturating_add(1));
        match store.set(key, &self.record_at(touch)) {
            Ok(()) => inner.last_touch = touch,
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "failed to refresh lease");
            }
        }
        ControlFlow::Continue(())
    }
}
