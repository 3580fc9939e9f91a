//! Time source abstraction for frame-driven clocks.
//!
//! A clock needs two readings from the outside world: a monotonic timestamp
//! used only to measure elapsed real time between frames, and the present
//! wall-clock instant. Production code reads both from the system, while
//! tests and replays drive them by hand through [`ManualTimeSource`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use chrono::TimeDelta;

use crate::time::{SimTime, seconds_to_delta};

/// Abstraction over the real-time readings a clock consumes.
pub trait TimeSource {
    /// Monotonic, non-decreasing timestamp in milliseconds.
    ///
    /// The origin is arbitrary; only differences between two readings are meaningful.
    fn timestamp_ms(&self) -> f64;

    /// The present real-world instant.
    fn now(&self) -> SimTime;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn timestamp_ms(&self) -> f64 {
        (**self).timestamp_ms()
    }

    fn now(&self) -> SimTime {
        (**self).now()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn timestamp_ms(&self) -> f64 {
        (**self).timestamp_ms()
    }

    fn now(&self) -> SimTime {
        (**self).now()
    }
}

/// Real time source backed by the operating system.
///
/// Timestamps are measured from the moment the source was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Create a source whose timestamps count from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn timestamp_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000.0
    }

    fn now(&self) -> SimTime {
        SimTime::now()
    }
}

/// A hand-driven time source for deterministic tests.
///
/// Time only moves when told to. Uses [`Cell`] for interior mutability, so it
/// is single-threaded; share it with a clock through `&ManualTimeSource` or
/// `Rc<ManualTimeSource>`.
///
/// # Example
///
/// ```
/// use tg_core::{ManualTimeSource, SimTime, TimeSource};
///
/// let start: SimTime = "2024-01-01T00:00:00Z".parse().unwrap();
/// let source = ManualTimeSource::new(start);
/// source.advance_ms(1_500.0);
/// assert_eq!(source.timestamp_ms(), 1_500.0);
/// assert_eq!(source.now(), start.add_seconds(1.5));
/// ```
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    timestamp_ms: Cell<f64>,
    now: Cell<SimTime>,
}

impl ManualTimeSource {
    /// Create a source at timestamp zero whose wall clock reads `now`.
    pub fn new(now: SimTime) -> Self {
        Self {
            timestamp_ms: Cell::new(0.0),
            now: Cell::new(now),
        }
    }

    /// Let `ms` milliseconds of real time pass.
    ///
    /// Moves the monotonic timestamp and the wall clock together. Negative
    /// values are ignored so the timestamp never runs backwards.
    pub fn advance_ms(&self, ms: f64) {
        if ms.is_nan() || ms <= 0.0 {
            return;
        }
        self.timestamp_ms.set(self.timestamp_ms.get() + ms);
        let delta: TimeDelta = seconds_to_delta(ms / 1_000.0);
        self.now.set(self.now.get().add_delta(delta));
    }

    /// Reposition the wall clock without touching the monotonic timestamp.
    pub fn set_now(&self, now: SimTime) {
        self.now.set(now);
    }
}

impl TimeSource for ManualTimeSource {
    fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms.get()
    }

    fn now(&self) -> SimTime {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> SimTime {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn system_source_is_monotonic() {
        let source = SystemTimeSource::new();
        let t1 = source.timestamp_ms();
        let t2 = source.timestamp_ms();
        assert!(t1 >= 0.0);
        assert!(t2 >= t1);
    }

    #[test]
    fn system_source_reads_wall_clock() {
        let source = SystemTimeSource::default();
        let floor: SimTime = "2020-01-01T00:00:00Z".parse().unwrap();
        assert!(source.now() > floor);
    }

    #[test]
    fn manual_source_starts_at_zero() {
        let source = ManualTimeSource::new(start());
        assert_eq!(source.timestamp_ms(), 0.0);
        assert_eq!(source.now(), start());
    }

    #[test]
    fn manual_source_advances_both_readings() {
        let source = ManualTimeSource::new(start());
        source.advance_ms(250.0);
        source.advance_ms(750.0);
        assert_eq!(source.timestamp_ms(), 1_000.0);
        assert_eq!(source.now(), start().add_seconds(1.0));
    }

    #[test]
    fn manual_source_never_runs_backwards() {
        let source = ManualTimeSource::new(start());
        source.advance_ms(100.0);
        source.advance_ms(-50.0);
        source.advance_ms(f64::NAN);
        assert_eq!(source.timestamp_ms(), 100.0);
    }

    #[test]
    fn set_now_leaves_timestamp_alone() {
        let source = ManualTimeSource::new(start());
        source.advance_ms(10.0);
        let later = start().add_days(3.0);
        source.set_now(later);
        assert_eq!(source.now(), later);
        assert_eq!(source.timestamp_ms(), 10.0);
    }

    #[test]
    fn shared_handles_read_the_same_source() {
        let source = Rc::new(ManualTimeSource::new(start()));
        let handle = Rc::clone(&source);
        source.advance_ms(42.0);
        assert_eq!(handle.timestamp_ms(), 42.0);
        let by_ref: &ManualTimeSource = &source;
        assert_eq!(TimeSource::timestamp_ms(&by_ref), 42.0);
    }
}
