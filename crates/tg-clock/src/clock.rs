use std::fmt;

use chrono::TimeDelta;
use tg_core::{SimTime, SystemTimeSource, TimeSource};
use tracing::{debug, trace, warn};

use crate::config::ClockConfig;
use crate::error::{ClockError, ClockResult};
use crate::event::{ClockEvent, ClockEventKind, EventLog};
use crate::notify::Listeners;
use crate::step::{ClockRange, ClockStep};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Listener list type for a clock reading from `S`.
pub type ClockListeners<S> = Listeners<SimulatedClock<S>>;

/// Effect of assigning the current time, multiplier, or play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The value was equal to the stored one; nothing happened.
    Unchanged,
    /// The value was stored.
    Stored,
    /// The value was stored and the step mode fell back from
    /// [`ClockStep::SystemClock`] to [`ClockStep::SystemClockMultiplier`].
    StoredAndDemoted,
}

impl Assignment {
    /// Returns true if the value was stored.
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns true if the step mode was demoted.
    pub fn demoted(self) -> bool {
        matches!(self, Self::StoredAndDemoted)
    }
}

/// Effect of assigning the step mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    /// The step mode before the assignment.
    pub previous: ClockStep,
    /// True if the assignment forced multiplier 1, playing, and the current
    /// time to the real-world instant.
    pub synced_to_system: bool,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The current time after the tick.
    pub time: SimTime,
    /// Whether the clock was allowed to move.
    pub advanced: bool,
    /// How many times the upper bound was reached during the tick.
    pub stops: u64,
}

/// A simulated-time clock advanced once per external tick.
///
/// The host calls [`tick`](Self::tick) once per frame. How far simulated time
/// moves is governed by the [`ClockStep`]; what happens at the configured
/// bounds is governed by the [`ClockRange`].
///
/// Assigning the current time, the multiplier, or the play state while in
/// [`ClockStep::SystemClock`] drops the clock back to
/// [`ClockStep::SystemClockMultiplier`]. The setters report this through
/// their returned [`Assignment`].
///
/// # Notifications
///
/// Listeners registered with [`on_stop`](Self::on_stop) and
/// [`on_tick`](Self::on_tick) run synchronously at the end of each tick,
/// after the clock state has been updated: stop listeners once per boundary
/// hit, then tick listeners once. They receive `&SimulatedClock`, so they
/// cannot tick or reconfigure the clock from inside a notification; owners
/// that react to a stop read [`TickReport::stops`] instead.
pub struct SimulatedClock<S: TimeSource = SystemTimeSource> {
    source: S,
    current_time: SimTime,
    start_time: SimTime,
    stop_time: SimTime,
    clock_range: ClockRange,
    clock_step: ClockStep,
    multiplier: f64,
    can_advance: bool,
    should_advance: bool,
    last_timestamp_ms: f64,
    tick_count: u64,
    on_tick: ClockListeners<S>,
    on_stop: ClockListeners<S>,
    events: EventLog,
}

impl<S: TimeSource> fmt::Debug for SimulatedClock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedClock")
            .field("current_time", &self.current_time)
            .field("start_time", &self.start_time)
            .field("stop_time", &self.stop_time)
            .field("clock_range", &self.clock_range)
            .field("clock_step", &self.clock_step)
            .field("multiplier", &self.multiplier)
            .field("can_advance", &self.can_advance)
            .field("should_advance", &self.should_advance)
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}

impl SimulatedClock<SystemTimeSource> {
    /// Create a clock that reads real time from the operating system.
    pub fn new(config: ClockConfig) -> ClockResult<Self> {
        Self::with_source(config, SystemTimeSource::new())
    }
}

impl<S: TimeSource> SimulatedClock<S> {
    /// Create a clock that reads real time from `source`.
    ///
    /// Omitted times are resolved as described on [`ClockConfig`]. Fails with
    /// [`ClockError::InvalidRange`] if the resolved start lies after the
    /// resolved stop; no later mutation is validated.
    pub fn with_source(config: ClockConfig, source: S) -> ClockResult<Self> {
        let current_time = match (config.current_time, config.start_time, config.stop_time) {
            (Some(current), _, _) => current,
            (None, Some(start), _) => start,
            (None, None, Some(stop)) => stop.add_days(-1.0),
            (None, None, None) => source.now(),
        };
        let start_time = config.start_time.unwrap_or(current_time);
        let stop_time = config
            .stop_time
            .unwrap_or_else(|| start_time.add_days(1.0));
        if start_time > stop_time {
            return Err(ClockError::InvalidRange {
                start: start_time,
                stop: stop_time,
            });
        }

        let last_timestamp_ms = source.timestamp_ms();
        let mut clock = Self {
            source,
            current_time,
            start_time,
            stop_time,
            clock_range: config.clock_range,
            clock_step: ClockStep::SystemClockMultiplier,
            multiplier: config.multiplier,
            can_advance: config.can_advance,
            should_advance: config.should_advance,
            last_timestamp_ms,
            tick_count: 0,
            on_tick: Listeners::new(),
            on_stop: Listeners::new(),
            events: EventLog::new(config.max_events),
        };
        // Last, so a requested SystemClock overrides the values above.
        clock.set_clock_step(config.clock_step);
        Ok(clock)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Return the current simulated time.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// Return the lower bound of the clock range.
    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    /// Return the upper bound of the clock range.
    pub fn stop_time(&self) -> SimTime {
        self.stop_time
    }

    /// Return the range behavior.
    pub fn clock_range(&self) -> ClockRange {
        self.clock_range
    }

    /// Return the step mode.
    pub fn clock_step(&self) -> ClockStep {
        self.clock_step
    }

    /// Return the multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Return whether the host allows the clock to advance.
    pub fn can_advance(&self) -> bool {
        self.can_advance
    }

    /// Return whether the clock is playing.
    pub fn should_advance(&self) -> bool {
        self.should_advance
    }

    /// Returns true if the next tick will move simulated time.
    pub fn is_advancing(&self) -> bool {
        self.can_advance && self.should_advance
    }

    /// Return the time-source timestamp recorded by the last tick (or construction).
    pub fn last_timestamp_ms(&self) -> f64 {
        self.last_timestamp_ms
    }

    /// Return the number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Return the clock-event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Return the clock-event log for draining or clearing.
    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    /// Listeners fired once at the end of every tick.
    pub fn on_tick(&mut self) -> &mut ClockListeners<S> {
        &mut self.on_tick
    }

    /// Listeners fired once per upper-bound hit under a bounding range.
    ///
    /// Listeners cannot reconfigure the clock. To pause when the bound is
    /// reached, check [`TickReport::stops`] after ticking:
    ///
    /// ```
    /// # use tg_clock::{ClockConfig, ClockRange, ClockStep, SimulatedClock};
    /// let mut clock = SimulatedClock::new(
    ///     ClockConfig::default()
    ///         .with_clock_step(ClockStep::TickDependent)
    ///         .with_clock_range(ClockRange::Clamped)
    ///         .with_multiplier(2.0 * 86_400.0)
    ///         .with_should_advance(true),
    /// )
    /// .unwrap();
    /// if clock.tick_report().stops > 0 {
    ///     clock.set_should_advance(false);
    /// }
    /// assert!(!clock.should_advance());
    /// assert_eq!(clock.current_time(), clock.stop_time());
    /// ```
    pub fn on_stop(&mut self) -> &mut ClockListeners<S> {
        &mut self.on_stop
    }

    // -----------------------------------------------------------------------
    // Coupled setters
    // -----------------------------------------------------------------------

    /// Assign the current simulated time.
    ///
    /// The time is not checked against the range; only ticks apply the range.
    pub fn set_current_time(&mut self, time: SimTime) -> Assignment {
        if self.current_time == time {
            return Assignment::Unchanged;
        }
        let demoted = self.demote_system_clock();
        self.current_time = time;
        stored(demoted)
    }

    /// Assign the multiplier. Negative values play backwards.
    pub fn set_multiplier(&mut self, multiplier: f64) -> Assignment {
        if self.multiplier == multiplier {
            return Assignment::Unchanged;
        }
        let demoted = self.demote_system_clock();
        self.multiplier = multiplier;
        stored(demoted)
    }

    /// Assign the play state.
    pub fn set_should_advance(&mut self, should_advance: bool) -> Assignment {
        if self.should_advance == should_advance {
            return Assignment::Unchanged;
        }
        let demoted = self.demote_system_clock();
        self.should_advance = should_advance;
        stored(demoted)
    }

    /// Assign the step mode.
    ///
    /// Switching to [`ClockStep::SystemClock`] also sets the multiplier to 1,
    /// starts playing, and jumps the current time to the real-world instant.
    pub fn set_clock_step(&mut self, step: ClockStep) -> StepChange {
        let previous = self.clock_step;
        let synced_to_system = step == ClockStep::SystemClock;
        if synced_to_system {
            self.multiplier = 1.0;
            self.should_advance = true;
            self.current_time = self.source.now();
        }
        self.clock_step = step;
        if previous != step {
            debug!(%previous, %step, "clock step changed");
        }
        StepChange {
            previous,
            synced_to_system,
        }
    }

    // -----------------------------------------------------------------------
    // Plain setters
    // -----------------------------------------------------------------------

    /// Assign the lower bound. Not validated against the upper bound.
    pub fn set_start_time(&mut self, time: SimTime) {
        self.start_time = time;
    }

    /// Assign the upper bound. Not validated against the lower bound.
    pub fn set_stop_time(&mut self, time: SimTime) {
        self.stop_time = time;
    }

    /// Assign the range behavior.
    pub fn set_clock_range(&mut self, range: ClockRange) {
        self.clock_range = range;
    }

    /// Assign whether the host allows the clock to advance.
    pub fn set_can_advance(&mut self, can_advance: bool) {
        self.can_advance = can_advance;
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Advance the clock by one tick and return the new current time.
    pub fn tick(&mut self) -> SimTime {
        self.tick_report().time
    }

    /// Advance the clock by one tick and report what happened.
    pub fn tick_report(&mut self) -> TickReport {
        let timestamp_ms = self.source.timestamp_ms();
        let advanced = self.is_advancing();
        let mut time = self.current_time;
        let mut stops = 0;

        if advanced {
            if self.clock_step == ClockStep::SystemClock {
                time = self.source.now();
            } else {
                let seconds = match self.clock_step {
                    ClockStep::TickDependent => self.multiplier,
                    _ => self.multiplier * (timestamp_ms - self.last_timestamp_ms) / 1_000.0,
                };
                time = time.add_seconds(seconds);
                if self.clock_range.is_bounded() {
                    (time, stops) = self.apply_range(time);
                }
            }
        }

        self.current_time = time;
        self.last_timestamp_ms = timestamp_ms;
        self.tick_count += 1;
        let tick = self.tick_count;
        trace!(tick, %time, advanced, stops, "clock ticked");

        if stops > 0 {
            debug!(tick, laps = stops, %time, "clock stop reached");
            self.events
                .push(ClockEvent::new(tick, time, ClockEventKind::StopReached { laps: stops }));
        }
        self.events
            .push(ClockEvent::new(tick, time, ClockEventKind::Ticked { advanced }));

        let this = &*self;
        if !this.on_stop.is_empty() {
            for _ in 0..stops {
                this.on_stop.notify(this);
            }
        }
        this.on_tick.notify(this);

        TickReport {
            time,
            advanced,
            stops,
        }
    }

    fn demote_system_clock(&mut self) -> bool {
        if self.clock_step != ClockStep::SystemClock {
            return false;
        }
        self.clock_step = ClockStep::SystemClockMultiplier;
        debug!("clock step demoted to system_clock_multiplier");
        true
    }

    /// Apply the range policy to a freshly advanced time. Returns the bounded
    /// time and the number of upper-bound hits.
    fn apply_range(&self, time: SimTime) -> (SimTime, u64) {
        let (start, stop) = (self.start_time, self.stop_time);
        match self.clock_range {
            ClockRange::Unbounded => (time, 0),
            ClockRange::Clamped => {
                if time < start {
                    (start, 0)
                } else if time >= stop {
                    (stop, 1)
                } else {
                    (time, 0)
                }
            }
            ClockRange::LoopStop => {
                let time = time.max(start);
                if time < stop {
                    (time, 0)
                } else if stop <= start {
                    warn!(%start, %stop, "loop range is empty; holding at start");
                    (start, 1)
                } else {
                    wrap_into_range(time, start, stop)
                }
            }
        }
    }
}

fn stored(demoted: bool) -> Assignment {
    if demoted {
        Assignment::StoredAndDemoted
    } else {
        Assignment::Stored
    }
}

/// Fold a time at or past `stop` back into `[start, stop)`, counting one lap
/// per span consumed. Requires `start < stop <= time`.
fn wrap_into_range(time: SimTime, start: SimTime, stop: SimTime) -> (SimTime, u64) {
    let overshoot = to_nanos(time.delta_since(&stop));
    let span = to_nanos(stop.delta_since(&start));
    let laps = u64::try_from(overshoot / span + 1).unwrap_or(u64::MAX);
    (start.add_delta(from_nanos(overshoot % span)), laps)
}

fn to_nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

fn from_nanos(nanos: i128) -> TimeDelta {
    let seconds = i64::try_from(nanos / NANOS_PER_SECOND).unwrap_or(i64::MAX);
    let rest = i64::try_from(nanos % NANOS_PER_SECOND).unwrap_or(0);
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| delta.checked_add(&TimeDelta::nanoseconds(rest)))
        .unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tg_core::ManualTimeSource;

    use super::*;

    fn day0() -> SimTime {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    fn wall() -> SimTime {
        "2030-06-15T08:00:00Z".parse().unwrap()
    }

    fn source() -> Rc<ManualTimeSource> {
        Rc::new(ManualTimeSource::new(wall()))
    }

    fn clock(config: ClockConfig) -> SimulatedClock<Rc<ManualTimeSource>> {
        SimulatedClock::with_source(config, source()).unwrap()
    }

    #[test]
    fn defaults_only_follow_the_wall_clock() {
        let clock = clock(ClockConfig::default());
        assert_eq!(clock.current_time(), wall());
        assert_eq!(clock.start_time(), clock.current_time());
        assert_eq!(clock.stop_time(), clock.start_time().add_days(1.0));
        assert_eq!(clock.clock_step(), ClockStep::SystemClockMultiplier);
        assert_eq!(clock.clock_range(), ClockRange::Unbounded);
        assert!((clock.multiplier() - 1.0).abs() < f64::EPSILON);
        assert!(clock.can_advance());
        assert!(!clock.should_advance());
        assert_eq!(clock.tick_count(), 0);
    }

    #[test]
    fn current_time_defaults_to_start() {
        let clock = clock(ClockConfig::default().with_start_time(day0()));
        assert_eq!(clock.current_time(), day0());
        assert_eq!(clock.stop_time(), day0().add_days(1.0));
    }

    #[test]
    fn current_time_defaults_to_day_before_stop() {
        let stop = day0().add_days(10.0);
        let clock = clock(ClockConfig::default().with_stop_time(stop));
        assert_eq!(clock.current_time(), day0().add_days(9.0));
        assert_eq!(clock.start_time(), day0().add_days(9.0));
        assert_eq!(clock.stop_time(), stop);
    }

    #[test]
    fn start_defaults_to_current() {
        let now = day0().add_seconds(30.0);
        let clock = clock(ClockConfig::default().with_current_time(now));
        assert_eq!(clock.start_time(), now);
        assert_eq!(clock.stop_time(), now.add_days(1.0));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = SimulatedClock::with_source(
            ClockConfig::default()
                .with_start_time(day0().add_days(2.0))
                .with_stop_time(day0()),
            source(),
        )
        .unwrap_err();
        assert!(matches!(err, ClockError::InvalidRange { .. }));
        assert!(err.to_string().contains("must not be after"));
    }

    #[test]
    fn inverted_range_from_defaults_is_rejected() {
        // Current time after an explicit stop makes the defaulted start invalid.
        let result = SimulatedClock::with_source(
            ClockConfig::default()
                .with_current_time(day0().add_days(5.0))
                .with_stop_time(day0()),
            source(),
        );
        assert!(matches!(result, Err(ClockError::InvalidRange { .. })));
    }

    #[test]
    fn empty_range_is_allowed() {
        let clock = clock(
            ClockConfig::default()
                .with_start_time(day0())
                .with_stop_time(day0()),
        );
        assert_eq!(clock.start_time(), clock.stop_time());
    }

    #[test]
    fn system_clock_requested_at_construction_wins() {
        let clock = clock(
            ClockConfig::default()
                .with_current_time(day0())
                .with_multiplier(10.0)
                .with_should_advance(false)
                .with_clock_step(ClockStep::SystemClock),
        );
        assert_eq!(clock.clock_step(), ClockStep::SystemClock);
        assert_eq!(clock.current_time(), wall());
        assert!((clock.multiplier() - 1.0).abs() < f64::EPSILON);
        assert!(clock.should_advance());
        // Bounds were resolved from the configured current time.
        assert_eq!(clock.start_time(), day0());
    }

    #[test]
    fn system_clock_step_forces_follow_state() {
        let mut clock = clock(
            ClockConfig::default()
                .with_current_time(day0())
                .with_multiplier(-4.0),
        );
        let change = clock.set_clock_step(ClockStep::SystemClock);
        assert_eq!(change.previous, ClockStep::SystemClockMultiplier);
        assert!(change.synced_to_system);
        assert_eq!(clock.current_time(), wall());
        assert!((clock.multiplier() - 1.0).abs() < f64::EPSILON);
        assert!(clock.should_advance());
    }

    #[test]
    fn other_steps_leave_fields_alone() {
        let mut clock = clock(ClockConfig::default().with_current_time(day0()));
        let change = clock.set_clock_step(ClockStep::TickDependent);
        assert!(!change.synced_to_system);
        assert_eq!(clock.current_time(), day0());
        assert!(!clock.should_advance());
    }

    #[test]
    fn setters_demote_system_clock() {
        let mut c = clock(ClockConfig::default().with_clock_step(ClockStep::SystemClock));
        assert_eq!(c.set_multiplier(2.0), Assignment::StoredAndDemoted);
        assert_eq!(c.clock_step(), ClockStep::SystemClockMultiplier);

        c.set_clock_step(ClockStep::SystemClock);
        assert_eq!(c.set_should_advance(false), Assignment::StoredAndDemoted);
        assert_eq!(c.clock_step(), ClockStep::SystemClockMultiplier);

        c.set_clock_step(ClockStep::SystemClock);
        assert_eq!(c.set_current_time(day0()), Assignment::StoredAndDemoted);
        assert_eq!(c.clock_step(), ClockStep::SystemClockMultiplier);
        assert_eq!(c.current_time(), day0());
    }

    #[test]
    fn equal_assignments_do_not_demote() {
        let mut c = clock(ClockConfig::default().with_clock_step(ClockStep::SystemClock));
        let now = c.current_time();
        assert_eq!(c.set_current_time(now), Assignment::Unchanged);
        assert_eq!(c.set_multiplier(1.0), Assignment::Unchanged);
        assert_eq!(c.set_should_advance(true), Assignment::Unchanged);
        assert_eq!(c.clock_step(), ClockStep::SystemClock);
    }

    #[test]
    fn setters_outside_system_clock_only_store() {
        let mut c = clock(ClockConfig::default().with_clock_step(ClockStep::TickDependent));
        let result = c.set_multiplier(-3.0);
        assert_eq!(result, Assignment::Stored);
        assert!(result.changed());
        assert!(!result.demoted());
        assert_eq!(c.clock_step(), ClockStep::TickDependent);
        assert!((c.multiplier() + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn current_time_may_leave_the_range() {
        let mut c = clock(
            ClockConfig::default()
                .with_start_time(day0())
                .with_clock_range(ClockRange::Clamped),
        );
        let outside = day0().add_days(-30.0);
        assert!(c.set_current_time(outside).changed());
        assert_eq!(c.current_time(), outside);
    }

    #[test]
    fn bounds_are_not_revalidated() {
        let mut c = clock(ClockConfig::default().with_start_time(day0()));
        c.set_start_time(day0().add_days(5.0));
        assert!(c.start_time() > c.stop_time());
    }

    #[test]
    fn wrap_counts_whole_spans() {
        let start = day0();
        let stop = day0().add_days(1.0);
        let (time, laps) = wrap_into_range(stop, start, stop);
        assert_eq!((time, laps), (start, 1));
        let (time, laps) = wrap_into_range(day0().add_days(1.5), start, stop);
        assert_eq!((time, laps), (day0().add_days(0.5), 1));
        let (time, laps) = wrap_into_range(day0().add_days(3.25), start, stop);
        assert_eq!((time, laps), (day0().add_days(0.25), 3));
    }

    #[test]
    fn nanos_conversions_are_exact() {
        let delta = TimeDelta::seconds(-3) + TimeDelta::nanoseconds(-250);
        assert_eq!(from_nanos(to_nanos(delta)), delta);
        let delta = TimeDelta::days(40_000) + TimeDelta::nanoseconds(7);
        assert_eq!(from_nanos(to_nanos(delta)), delta);
    }

    #[test]
    fn debug_shows_state() {
        let c = clock(ClockConfig::default().with_start_time(day0()));
        let text = format!("{c:?}");
        assert!(text.contains("SimulatedClock"));
        assert!(text.contains("clock_step"));
    }
}
