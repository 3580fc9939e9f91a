//! Time primitives for Taktgeber.
//!
//! This crate defines the instant type that simulated clocks count in and the
//! [`TimeSource`] seam through which they read real time. It knows nothing
//! about stepping policies; see `tg-clock` for the clock itself.

/// Error types for parsing instants.
pub mod error;
/// Real and hand-driven time sources.
pub mod source;
/// The simulated instant type and second/delta conversions.
pub mod time;

/// Re-export error types.
pub use error::{TimeError, TimeResult};
/// Re-export time sources.
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource};
/// Re-export the instant type.
pub use time::SimTime;
