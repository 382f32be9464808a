//! # Temporal Types: UTC-Only Timestamps and the Clock Seam
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds precision,
//! and the [`Clock`] trait through which the authority learns the current
//! time.
//!
//! ## Why seconds precision
//!
//! Expiration comparisons are exact (`T' > T`). Sub-second noise from a
//! caller's serializer must not turn an "equal" extension into a "later"
//! one, so every constructor truncates.
//!
//! ## Sensible range
//!
//! Any instant chrono can represent is a `Timestamp`, but only instants in
//! `1970-01-01T00:00:00Z ..= 9999-12-31T23:59:59Z` are accepted as license
//! expirations. See [`Timestamp::ensure_sensible`].

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Largest epoch second accepted by [`Timestamp::ensure_sensible`]
/// (`9999-12-31T23:59:59Z`).
pub const MAX_SENSIBLE_EPOCH_SECS: i64 = 253_402_300_799;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time, truncated.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`]: from an RFC 3339 string, converting offsets to UTC.
/// - [`Timestamp::from_epoch_secs()`]: from Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// Any offset is accepted and converted to UTC; the `Z` suffix is not
    /// required. Sub-seconds are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|e| {
            ValidationError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            ValidationError::InvalidTimestamp(format!("invalid Unix timestamp: {secs}"))
        })?;
        Ok(Self(dt))
    }

    /// Reject instants outside the range a license expiration may take.
    pub fn ensure_sensible(&self) -> Result<(), ValidationError> {
        let secs = self.epoch_secs();
        if !(0..=MAX_SENSIBLE_EPOCH_SECS).contains(&secs) {
            return Err(ValidationError::InvalidTimestamp(format!(
                "{self} is outside 1970-01-01T00:00:00Z..=9999-12-31T23:59:59Z"
            )));
        }
        Ok(())
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Shift by a signed number of seconds, saturating at chrono's range.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Duration::try_seconds(secs)
            .and_then(|d| self.0.checked_add_signed(d))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

// ─── Clock ───────────────────────────────────────────────────────────

/// Source of "now" for status derivation and event timestamps.
///
/// Implementations must be `Send + Sync`; a single clock is shared by every
/// thread that touches the registry.
pub trait Clock: Send + Sync {
    /// The current instant, truncated to seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A manually driven clock for tests and replay tooling.
#[derive(Debug)]
pub struct FixedClock {
    epoch_secs: AtomicI64,
}

impl FixedClock {
    /// Create a clock frozen at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            epoch_secs: AtomicI64::new(at.epoch_secs()),
        }
    }

    /// Move the clock to `at` (may go backwards).
    pub fn set(&self, at: Timestamp) {
        self.epoch_secs.store(at.epoch_secs(), Ordering::SeqCst);
    }

    /// Advance the clock by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.epoch_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let secs = self.epoch_secs.load(Ordering::SeqCst);
        Timestamp::from_epoch_secs(secs).unwrap_or_else(|_| Timestamp::now())
    }
}
