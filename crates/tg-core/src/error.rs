//! Error types for the time primitives.

/// Alias for `Result<T, TimeError>`.
pub type TimeResult<T> = Result<T, TimeError>;

/// Errors that can occur when building instants from external input.
#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    /// The input was not a valid RFC 3339 timestamp.
    #[error("invalid timestamp \"{input}\": {reason}")]
    Parse {
        /// The rejected input text.
        input: String,
        /// Why the parser rejected it.
        reason: String,
    },
}
