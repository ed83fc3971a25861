//! Error types for the Network

use sim_clock::{CallbackError, ClockError};
use thiserror::Error;

/// Errors that can occur while building or running a Network
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Group {name} is already in network")]
    GroupAlreadyPresent { name: String },

    #[error("Group {name} setup failed: {source}")]
    Setup {
        name: String,
        #[source]
        source: CallbackError,
    },

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
}

/// A group failed while the clock was evaluating the network
#[derive(Error, Debug)]
#[error("Group {name} evaluation failed: {source}")]
pub struct EvaluateError {
    pub name: String,
    #[source]
    pub source: CallbackError,
}
