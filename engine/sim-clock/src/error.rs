//! Error types for SimClock

use thiserror::Error;

/// Error returned by a timer callback.
///
/// Boxed so callbacks can surface any error type; `anyhow::Error` converts with `?`.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the Clock
#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Cannot {operation} while the clock is running")]
    ConfigConflict { operation: &'static str },

    #[error("Invalid bounds: end ({end}) must not be before start ({start})")]
    InvalidBounds { start: f64, end: f64 },

    #[error("Invalid resolution {resolution}: must be finite and greater than zero")]
    InvalidResolution { resolution: f64 },

    #[error("Invalid timer period {period}: must be finite and greater than zero")]
    InvalidPeriod { period: f64 },

    #[error("Clock is already running")]
    AlreadyRunning,

    #[error("Timer callback failed at time {time}: {source}")]
    Callback {
        time: f64,
        #[source]
        source: CallbackError,
    },

    #[error("Runaway tick at time {time}: {firings} firings exceeded the per-tick limit")]
    RunawayTick { time: f64, firings: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClockError {
    /// True for errors raised by a mutator that is only legal while stopped
    pub fn is_config_conflict(&self) -> bool {
        matches!(self, ClockError::ConfigConflict { .. })
    }
}
