use tg_core::SimTime;

/// Alias for `Result<T, ClockError>`.
pub type ClockResult<T> = Result<T, ClockError>;

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The resolved start time lies after the resolved stop time.
    #[error("invalid range: start {start} must not be after stop {stop}")]
    InvalidRange {
        /// The resolved start time.
        start: SimTime,
        /// The resolved stop time.
        stop: SimTime,
    },

    /// A clock configuration document could not be read.
    #[error("invalid clock config: {0}")]
    Config(#[from] serde_json::Error),
}
