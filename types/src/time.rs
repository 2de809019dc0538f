//! Timestamp type and the clock seam.
//!
//! Timestamps are Unix epoch seconds (UTC). Calendar dates for attendance
//! records are derived from a timestamp plus a fixed UTC offset, so a node
//! configured for a campus time zone files records under the local date.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether more than `ttl_secs` have passed between this timestamp and `now`.
    ///
    /// The window is closed: at exactly `self + ttl_secs` the timestamp is
    /// still fresh.
    pub fn is_older_than(&self, ttl_secs: u64, now: Timestamp) -> bool {
        self.elapsed_since(now) > ttl_secs
    }

    /// Local calendar date and wall-clock time at the given UTC offset.
    ///
    /// Offsets outside ±24h fall back to UTC.
    pub fn to_local(&self, utc_offset_minutes: i32) -> (NaiveDate, NaiveTime) {
        let secs = i64::try_from(self.0).unwrap_or(i64::MAX);
        let utc = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();
        match utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
        {
            Some(offset) => {
                let local = utc.with_timezone(&offset);
                (local.date_naive(), local.time())
            }
            None => (utc.date_naive(), utc.time()),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time.
///
/// The engine never samples the clock itself; the boundary layer asks a
/// `Clock` and passes the timestamp in.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
