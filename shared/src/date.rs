//! Timestamp type
//!
//! Millisecond timestamps backed by `chrono`, used for request stamping and
//! placeholder token minting. `chrono`'s `wasmbind` feature makes `now()`
//! work in the browser as well as natively.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// ISO 8601 with millisecond precision and a `Z` suffix,
    /// e.g. `2024-06-01T08:30:00.000Z`.
    pub fn to_iso_string(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}
