//! # SimNetwork
//!
//! The main tenant of a [`sim_clock::Clock`]: a [`Network`] owns a list of simulation
//! [`Group`]s and registers a single timer that asks every group to advance by the
//! clock's resolution on each tick.

pub mod error;
pub mod group;
pub mod network;


pub use error::{EvaluateError, NetworkError};
pub use group::Group;
pub use network::{Network, RunSpan};

/// Default simulated duration of [`RunSpan::Duration`]
pub const DEFAULT_RUN_TIME: f64 = 1.0;

/// Default resolution of [`RunSpan::Duration`]
pub const DEFAULT_RUN_DT: f64 = 0.01;
