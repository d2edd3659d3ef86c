//! Protocol timing constants.
//!
//! Correctness of the storage protocol rests on
//! `oldest_touch >> touch_interval >> acquire_interval`.

use crate::error::{MutexError, Result};
use std::time::Duration;

/// Age after which a lease record may be reclaimed.
pub const DEFAULT_OLDEST_TOUCH: Duration = Duration::from_millis(2000);

/// Period of the acquisition poll.
pub const DEFAULT_ACQUIRE_INTERVAL: Duration = Duration::from_millis(1);

/// Period of the holder's heartbeat.
pub const DEFAULT_TOUCH_INTERVAL: Duration = Duration::from_millis(5);

/// Period of the native-lock timeout watchdog.
pub const DEFAULT_NATIVE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The full set of periods and thresholds a request runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub oldest_touch: Duration,
    pub acquire_interval: Duration,
    pub touch_interval: Duration,
    pub native_poll_interval: Duration,
}

impl Timing {
    pub fn oldest_touch_ms(&self) -> i64 {
        i64::try_from(self.oldest_touch.as_millis()).unwrap_or(i64::MAX)
    }

    /// Check that every period is positive and that
    /// `acquire_interval <= touch_interval < oldest_touch`.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("oldest_touch", self.oldest_touch),
            ("acquire_interval", self.acquire_interval),
            ("touch_interval", self.touch_interval),
            ("native_poll_interval", self.native_poll_interval),
        ] {
            if value.is_zero() {
                return Err(MutexError::Config(format!(
                    "invalid timing: {} must be greater than 0",
                    field
                )));
            }
        }

        if self.acquire_interval > self.touch_interval {
            return Err(MutexError::Config(format!(
                "invalid timing: acquire_interval ({:?}) must not exceed touch_interval ({:?})",
                self.acquire_interval, self.touch_interval
            )));
        }

        if self.touch_interval >= self.oldest_touch {
            return Err(MutexError::Config(format!(
                "invalid timing: touch_interval ({:?}) must be less than oldest_touch ({:?})",
                self.touch_interval, self.oldest_touch
            )));
        }

        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            oldest_touch: DEFAULT_OLDEST_TOUCH,
            acquire_interval: DEFAULT_ACQUIRE_INTERVAL,
            touch_interval: DEFAULT_TOUCH_INTERVAL,
            native_poll_interval: DEFAULT_NATIVE_POLL_INTERVAL,
        }
    }
}
