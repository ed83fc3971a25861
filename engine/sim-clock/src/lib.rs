//! # SimClock
//!
//! Discrete-event simulation clock.
//!
//! A [`Clock`] advances simulated time in fixed steps of its resolution and, at every
//! step, fires the registered periodic [`Timer`]s that are due, lowest `order` first.
//! Timer callbacks receive the clock itself, so a running simulation can register,
//! remove or stop timers from inside a callback.
//!
//! ```
//! use sim_clock::{Callback, Clock};
//!
//! let mut clock = Clock::new(0.0, 1.0, 0.1).unwrap();
//! let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
//! let counter = fired.clone();
//! clock
//!     .add(
//!         &Callback::new(move |_clock, _time| {
//!             counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!             Ok(())
//!         }),
//!         None,
//!         0,
//!     )
//!     .unwrap();
//! clock.run(None, None, None).unwrap();
//! assert_eq!(fired.load(std::sync::atomic::Ordering::Relaxed), 10);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod timer;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ClockId, RunSummary};
pub use config::{ClockConfig, EndBoundary};
pub use error::{CallbackError, ClockError};
pub use metrics::{ClockMetrics, MetricsCollector};
pub use timer::{Callback, Timer, TimerHandle, TimerId, TimerInfo};

/// Current version of the SimClock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default start time in seconds
pub const DEFAULT_START: f64 = 0.0;

/// Default end time in seconds
pub const DEFAULT_END: f64 = 1.0 * units::SECOND;

/// Default resolution (1ms per tick)
pub const DEFAULT_RESOLUTION: f64 = 1.0 * units::MILLISECOND;

/// Default tolerance used to decide whether a timer is due within the current tick
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Simulated time units. Simulated time is expressed in seconds.
pub mod units {
    pub const SECOND: f64 = 1.0;
    pub const MILLISECOND: f64 = 0.001;
    pub const MS: f64 = MILLISECOND;
}

/// Well-known tie-break orders relative to the default tick.
pub mod order {
    /// Fires just before timers registered at the default order
    pub const BEFORE: i32 = -1;
    /// Order used when none is given
    pub const DEFAULT: i32 = 0;
    /// Fires just after timers registered at the default order
    pub const AFTER: i32 = 1;
}
