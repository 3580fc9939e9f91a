//! Frame-driven simulated clock for Taktgeber.
//!
//! A [`SimulatedClock`] keeps a notion of "current time" that moves once per
//! external tick, independent of how long frames actually take. The step mode
//! decides how far each tick moves; the range behavior decides what happens
//! at the configured start and stop bounds.
//!
//! ```
//! use tg_clock::{ClockConfig, ClockRange, ClockStep, SimulatedClock};
//! use tg_core::SimTime;
//!
//! let start: SimTime = "2024-01-01T00:00:00Z".parse().unwrap();
//! let mut clock = SimulatedClock::new(
//!     ClockConfig::default()
//!         .with_start_time(start)
//!         .with_clock_step(ClockStep::TickDependent)
//!         .with_clock_range(ClockRange::LoopStop)
//!         .with_multiplier(36.0 * 3600.0)
//!         .with_should_advance(true),
//! )
//! .unwrap();
//!
//! let report = clock.tick_report();
//! assert_eq!(report.time, start.add_seconds(12.0 * 3600.0));
//! assert_eq!(report.stops, 1);
//! ```

/// The simulated clock and its tick algorithm.
pub mod clock;
/// Construction options for clocks.
pub mod config;
/// Error types for the clock crate.
pub mod error;
/// Clock event types and the bounded event log.
pub mod event;
/// Synchronous listener lists.
pub mod notify;
/// Step modes and range behaviors.
pub mod step;

/// Re-exports of the clock and its setter/tick outcomes.
pub use clock::{Assignment, ClockListeners, SimulatedClock, StepChange, TickReport};
/// Re-export of [`config::ClockConfig`].
pub use config::ClockConfig;
/// Re-exports of [`error::ClockError`] and [`error::ClockResult`].
pub use error::{ClockError, ClockResult};
/// Re-exports of [`event::ClockEvent`], [`event::ClockEventKind`], and [`event::EventLog`].
pub use event::{ClockEvent, ClockEventKind, EventLog};
/// Re-exports of [`notify::Listeners`] and [`notify::ListenerId`].
pub use notify::{ListenerId, Listeners};
/// Re-exports of [`step::ClockRange`] and [`step::ClockStep`].
pub use step::{ClockRange, ClockStep};
