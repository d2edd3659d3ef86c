//! Lease record structure, encoding, and staleness checks.

use crate::error::{MutexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of one acquisition request.
///
/// The empty identifier means "nobody holds this lock".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(String);

impl HolderId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The empty identifier.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HolderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The shared record naming the believed holder of a lock.
///
/// Serialized as `{"id": "...", "when": <epoch ms>}`, with an optional
/// informational `owner`. Missing fields decode to their vacant values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Holder identifier; empty when nobody holds the lock.
    #[serde(rename = "id", default)]
    pub holder_id: HolderId,

    /// Last liveness proof, in epoch milliseconds.
    #[serde(rename = "when", default)]
    pub last_touch: i64,

    /// Who wrote the record (e.g. `user@HOST`). Ignored by the protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl LeaseRecord {
    /// The record a store reports when nothing usable is stored.
    pub fn vacant() -> Self {
        Self {
            holder_id: HolderId::empty(),
            last_touch: 0,
            owner: None,
        }
    }

    /// A record asserting that `holder` was alive at `at`.
    pub fn held_by(holder: &HolderId, at: i64) -> Self {
        Self {
            holder_id: holder.clone(),
            last_touch: at,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    pub fn is_held_by(&self, holder: &HolderId) -> bool {
        !holder.is_empty() && self.holder_id == *holder
    }

    /// Milliseconds since the last touch, as seen at `now`.
    pub fn age_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_touch)
    }

    /// Whether anyone may claim this record at `now`.
    pub fn is_stale(&self, now: i64, oldest_touch_ms: i64) -> bool {
        self.holder_id.is_empty() || self.age_ms(now) > oldest_touch_ms
    }

    /// Decode a record from its JSON text.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MutexError::MalformedRecord(e.to_string()))
    }

    /// Decode a record, treating anything unreadable as vacant.
    pub fn decode_or_vacant(text: &str) -> Self {
        match Self::decode(text) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "treating unreadable lease record as vacant");
                Self::vacant()
            }
        }
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MutexError::Storage(format!("failed to serialize lease record: {}", e)))
    }

    /// Format the age as a short human-readable string.
    pub fn age_string(&self, now: i64) -> String {
        let ms = self.age_ms(now).max(0);
        let seconds = ms / 1000;
        let minutes = seconds / 60;
        let hours = minutes / 60;

        if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else if seconds > 0 {
            format!("{}s", seconds)
        } else {
            format!("{}ms", ms)
        }
    }
}

/// Owner string written alongside records (`user@HOST`).
pub(crate) fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
