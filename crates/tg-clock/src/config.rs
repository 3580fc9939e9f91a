use serde::{Deserialize, Serialize};
use tg_core::SimTime;

use crate::error::ClockResult;
use crate::step::{ClockRange, ClockStep};

/// Default capacity of a clock's event log.
pub const DEFAULT_MAX_EVENTS: usize = 256;

/// Construction options for a [`SimulatedClock`](crate::SimulatedClock).
///
/// Omitted times are resolved when the clock is built: the current time
/// falls back to the start time, then to one day before the stop time, then
/// to the present instant; the start time falls back to the current time and
/// the stop time to one day after the start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Initial simulated time.
    pub current_time: Option<SimTime>,
    /// Lower bound of the clock range.
    pub start_time: Option<SimTime>,
    /// Upper bound of the clock range.
    pub stop_time: Option<SimTime>,
    /// Seconds per tick or real-time scale factor, depending on the step mode.
    pub multiplier: f64,
    /// How time advances per tick.
    pub clock_step: ClockStep,
    /// What happens at the range bounds.
    pub clock_range: ClockRange,
    /// Whether the host allows the clock to advance at all.
    pub can_advance: bool,
    /// Whether the clock is playing.
    pub should_advance: bool,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            current_time: None,
            start_time: None,
            stop_time: None,
            multiplier: 1.0,
            clock_step: ClockStep::default(),
            clock_range: ClockRange::default(),
            can_advance: true,
            should_advance: false,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl ClockConfig {
    /// Read a configuration from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ClockResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the initial simulated time.
    pub fn with_current_time(mut self, time: SimTime) -> Self {
        self.current_time = Some(time);
        self
    }

    /// Set the lower bound of the clock range.
    pub fn with_start_time(mut self, time: SimTime) -> Self {
        self.start_time = Some(time);
        self
    }

    /// Set the upper bound of the clock range.
    pub fn with_stop_time(mut self, time: SimTime) -> Self {
        self.stop_time = Some(time);
        self
    }

    /// Set the multiplier. Negative values play backwards.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the step mode.
    pub fn with_clock_step(mut self, step: ClockStep) -> Self {
        self.clock_step = step;
        self
    }

    /// Set the range behavior.
    pub fn with_clock_range(mut self, range: ClockRange) -> Self {
        self.clock_range = range;
        self
    }

    /// Set whether the host allows advancing.
    pub fn with_can_advance(mut self, can_advance: bool) -> Self {
        self.can_advance = can_advance;
        self
    }

    /// Set whether the clock starts playing.
    pub fn with_should_advance(mut self, should_advance: bool) -> Self {
        self.should_advance = should_advance;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }
}
