use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TimeError, TimeResult};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
// TimeDelta is bounded at i64::MAX milliseconds.
const MAX_WHOLE_SECONDS: f64 = (i64::MAX / 1_000) as f64;

/// A point in simulated time: a UTC instant with nanosecond precision.
///
/// Arithmetic never panics. Results that would leave chrono's representable
/// range saturate at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(DateTime<Utc>);

impl SimTime {
    /// Wrap a chrono UTC timestamp.
    pub fn from_utc(utc: DateTime<Utc>) -> Self {
        Self(utc)
    }

    /// The present real-world instant, read from the system wall clock.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Return the underlying chrono timestamp.
    pub fn as_utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// Return this instant moved by a signed, possibly fractional number of seconds.
    pub fn add_seconds(self, seconds: f64) -> Self {
        self.add_delta(seconds_to_delta(seconds))
    }

    /// Return this instant moved by a signed, possibly fractional number of days.
    pub fn add_days(self, days: f64) -> Self {
        self.add_seconds(days * SECONDS_PER_DAY)
    }

    /// Return this instant moved by an exact delta.
    pub fn add_delta(self, delta: TimeDelta) -> Self {
        match self.0.checked_add_signed(delta) {
            Some(utc) => Self(utc),
            None if delta < TimeDelta::zero() => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Exact signed delta from `earlier` to `self`.
    pub fn delta_since(&self, earlier: &Self) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }

    /// Signed number of seconds from `other` to `self` (`self - other`).
    pub fn seconds_difference(&self, other: &Self) -> f64 {
        delta_to_seconds(self.delta_since(other))
    }
}

impl From<DateTime<Utc>> for SimTime {
    fn from(utc: DateTime<Utc>) -> Self {
        Self(utc)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromStr for SimTime {
    type Err = TimeError;

    fn from_str(s: &str) -> TimeResult<Self> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|parsed| Self(parsed.with_timezone(&Utc)))
            .map_err(|e| TimeError::Parse {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Convert fractional seconds to a delta, saturating at the delta's range.
/// NaN converts to zero.
pub fn seconds_to_delta(seconds: f64) -> TimeDelta {
    if seconds.is_nan() {
        return TimeDelta::zero();
    }
    let whole = seconds.trunc();
    if whole >= MAX_WHOLE_SECONDS {
        return TimeDelta::MAX;
    }
    if whole <= -MAX_WHOLE_SECONDS {
        return TimeDelta::MIN;
    }
    let nanos = ((seconds - whole) * NANOS_PER_SECOND).round() as i64;
    TimeDelta::try_seconds(whole as i64)
        .and_then(|delta| delta.checked_add(&TimeDelta::nanoseconds(nanos)))
        .unwrap_or(if seconds > 0.0 {
            TimeDelta::MAX
        } else {
            TimeDelta::MIN
        })
}

/// Convert a delta to fractional seconds.
pub fn delta_to_seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / NANOS_PER_SECOND
}
