//! Request lifecycle states.

use std::fmt;

/// Sub-phase of an acquisition in progress on the storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquirePhase {
    /// No claim of ours is outstanding.
    Claiming,
    /// A claim was written; the next read decides whether it stuck.
    Confirming,
}

/// Where a request is in its lifecycle.
///
/// ```text
/// Idle -> Acquiring(Claiming) <-> Acquiring(Confirming) -> Locked
/// Acquiring -> TimedOut -> Completed
/// Acquiring -> Releasing -> Completed
/// Locked -> Releasing -> Completed
/// Locked -> Expired -> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutexState {
    Idle,
    Acquiring(AcquirePhase),
    Locked,
    Releasing,
    TimedOut,
    Expired,
    Completed,
}

impl MutexState {
    pub fn is_acquiring(&self) -> bool {
        matches!(self, MutexState::Idle | MutexState::Acquiring(_))
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, MutexState::Locked)
    }

    /// A terminal path has started; the completion callback is on its way.
    pub fn is_finishing(&self) -> bool {
        matches!(
            self,
            MutexState::Releasing | MutexState::TimedOut | MutexState::Expired | MutexState::Completed
        )
    }
}

impl fmt::Display for MutexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutexState::Idle => write!(f, "idle"),
            MutexState::Acquiring(AcquirePhase::Claiming) => write!(f, "acquiring"),
            MutexState::Acquiring(AcquirePhase::Confirming) => write!(f, "confirming"),
            MutexState::Locked => write!(f, "locked"),
            MutexState::Releasing => write!(f, "releasing"),
            MutexState::TimedOut => write!(f, "timed_out"),
            MutexState::Expired => write!(f, "expired"),
            MutexState::Completed => write!(f, "completed"),
        }
    }
}

/// How a finished request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `release()` was called.
    Released,
    /// Acquisition gave up after the timeout.
    TimedOut,
    /// The lock was held past its expiry and auto-released.
    Expired,
    /// The native primitive failed.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Released => write!(f, "released"),
            Outcome::TimedOut => write!(f, "timed_out"),
            Outcome::Expired => write!(f, "expired"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}
