use std::fmt;

use serde::{Deserialize, Serialize};

/// How much simulated time elapses per call to `tick`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockStep {
    /// Every tick advances by `multiplier` seconds, regardless of real time.
    TickDependent,
    /// Every tick advances by the real time elapsed since the previous tick,
    /// scaled by `multiplier`.
    #[default]
    SystemClockMultiplier,
    /// Every tick jumps to the present real-world instant.
    SystemClock,
}

impl fmt::Display for ClockStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TickDependent => "tick_dependent",
            Self::SystemClockMultiplier => "system_clock_multiplier",
            Self::SystemClock => "system_clock",
        };
        f.write_str(name)
    }
}

/// What happens when simulated time would leave `[start, stop]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockRange {
    /// No limit; the bounds are informational only.
    #[default]
    Unbounded,
    /// Hold at `start` or `stop` once reached.
    Clamped,
    /// Wrap back to `start` whenever `stop` is reached.
    LoopStop,
}

impl ClockRange {
    /// Returns true if this policy keeps time inside the configured bounds.
    pub fn is_bounded(self) -> bool {
        !matches!(self, Self::Unbounded)
    }
}

impl fmt::Display for ClockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbounded => "unbounded",
            Self::Clamped => "clamped",
            Self::LoopStop => "loop_stop",
        };
        f.write_str(name)
    }
}
