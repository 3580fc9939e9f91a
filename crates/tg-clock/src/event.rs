use std::collections::VecDeque;

use tg_core::SimTime;

/// What kind of clock event occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEventKind {
    /// A tick completed.
    Ticked {
        /// Whether the tick was allowed to move simulated time.
        advanced: bool,
    },
    /// The upper bound was reached or passed during the tick.
    StopReached {
        /// How many times the bound was reached. Always 1 when clamped.
        laps: u64,
    },
}

/// A record of something the clock did during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockEvent {
    /// The tick number this event belongs to, starting at 1.
    pub tick: u64,
    /// Simulated time at the end of the tick that produced the event.
    pub time: SimTime,
    /// The specific kind of event.
    pub kind: ClockEventKind,
}

impl ClockEvent {
    /// Create a new clock event.
    pub fn new(tick: u64, time: SimTime, kind: ClockEventKind) -> Self {
        Self { tick, time, kind }
    }

    /// Returns true if this event marks the upper bound being reached.
    pub fn is_stop(&self) -> bool {
        matches!(self.kind, ClockEventKind::StopReached { .. })
    }
}

/// Accumulates clock events for owners that poll instead of registering listeners.
#[derive(Debug, Default)]
pub struct EventLog {
    events: VecDeque<ClockEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: ClockEvent) {
        self.events.push_back(event);
        if self.max_events > 0 {
            while self.events.len() > self.max_events {
                self.events.pop_front();
            }
        }
    }

    /// Iterate over all recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ClockEvent> {
        self.events.iter()
    }

    /// Return all events recorded for the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&ClockEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all stop events.
    pub fn stops(&self) -> Vec<&ClockEvent> {
        self.events.iter().filter(|e| e.is_stop()).collect()
    }

    /// Remove and return all recorded events, oldest first.
    pub fn drain(&mut self) -> Vec<ClockEvent> {
        self.events.drain(..).collect()
    }

    /// Return the configured capacity (0 = unlimited).
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
