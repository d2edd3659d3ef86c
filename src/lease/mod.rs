//! Lease records and the timing model they are judged against.
//!
//! A lease record is the single piece of shared state behind a storage-backed
//! mutex: the identifier of the context that believes it holds the lock and
//! the last time that context proved it was alive.
//!
//! # Staleness
//!
//! A record is **stale** when its holder is empty or its `lastTouch` is older
//! than `oldest_touch` (2000 ms by default). Stale records may be claimed by
//! anyone, which bounds how long a crashed holder can keep a lock.
//!
//! # Clocks
//!
//! Timestamps are wall-clock milliseconds taken from a [`Clock`]. The default
//! [`SystemClock`] anchors to the wall clock once and then advances
//! monotonically, so a holder's heartbeats never move backwards even if the
//! system clock is adjusted underneath it.

mod clock;
mod record;
mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use record::{HolderId, LeaseRecord};
pub(crate) use record::owner_string;
pub use timing::{
    DEFAULT_ACQUIRE_INTERVAL, DEFAULT_NATIVE_POLL_INTERVAL, DEFAULT_OLDEST_TOUCH,
    DEFAULT_TOUCH_INTERVAL, Timing,
};
