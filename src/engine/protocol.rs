//! The per-tick decision of the storage protocol.
//!
//! Each acquisition tick reads the shared record once and then does exactly
//! one of: confirm the lock, write a claim, wait, or give up. The medium has no
//! compare-and-swap, so a claim is only trusted once a later read returns it
//! unchanged. Whoever wrote last wins.
//!
//! This is not linearizable. If one context reads a stale record, and another
//! context claims and confirms before the first one writes its own claim, both
//! end up believing they hold the lock. The window is the gap between a read
//! and the following write inside one tick.

use crate::lease::{HolderId, LeaseRecord};

/// What one acquisition tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// The record carries our identifier: the lock is ours.
    Confirm,
    /// The record is vacant or stale: write our claim and re-read next tick.
    Claim,
    /// Someone else holds a live lease: try again next tick.
    Wait,
    /// Someone else holds a live lease and our timeout has passed.
    GiveUp,
}

/// Decide one tick for the request `own`, started at `started_at`.
///
/// `timeout_ms == 0` waits forever.
pub fn decide(
    own: &HolderId,
    record: &LeaseRecord,
    now: i64,
    started_at: i64,
    timeout_ms: i64,
    oldest_touch_ms: i64,
) -> TickDecision {
    if record.is_held_by(own) {
        TickDecision::Confirm
    } else if record.is_stale(now, oldest_touch_ms) {
        TickDecision::Claim
    } else if timeout_ms > 0 && now.saturating_sub(started_at) > timeout_ms {
        TickDecision::GiveUp
    } else {
        TickDecision::Wait
    }
}
