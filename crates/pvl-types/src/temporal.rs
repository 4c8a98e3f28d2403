use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock reading with a logical tie-breaker.
///
/// Ledger entries of one batch must carry strictly increasing timestamps even
/// when two transitions land in the same millisecond or the host clock steps
/// backwards. [`Timestamp::successor_of`] provides that guarantee; the logical
/// counter is only non-zero when the physical clock failed to advance.
///
/// Ordering: `unix_ms` → `logical`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Milliseconds since the UNIX epoch.
    pub unix_ms: u64,
    /// Logical counter for readings within the same millisecond.
    pub logical: u32,
}

impl Timestamp {
    /// Create a timestamp with explicit values.
    pub const fn new(unix_ms: u64, logical: u32) -> Self {
        Self { unix_ms, logical }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            unix_ms,
            logical: 0,
        }
    }

    /// `self` if it is strictly after `previous`, otherwise the next logical tick.
    pub fn successor_of(self, previous: Option<&Timestamp>) -> Self {
        match previous {
            Some(prev) if self <= *prev => Self {
                unix_ms: prev.unix_ms,
                logical: prev.logical.saturating_add(1),
            },
            _ => self,
        }
    }

    /// RFC 3339 rendering of the physical component (UTC, millisecond precision).
    pub fn to_rfc3339(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.unix_ms as i64)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| format!("{}ms", self.unix_ms))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms.{})", self.unix_ms, self.logical)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.logical == 0 {
            write!(f, "{}", self.to_rfc3339())
        } else {
            write!(f, "{}+{}", self.to_rfc3339(), self.logical)
        }
    }
}
