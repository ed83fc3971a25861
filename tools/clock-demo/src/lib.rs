//! Clock demo library
//!
//! Configuration loading, logging setup and the demo scenarios driven by the
//! `clock-demo` binary.

use anyhow::{Context, Result};
use std::path::Path;

pub mod config;
pub mod demos;
pub mod logging;

pub use config::DemoConfig;
pub use logging::initialize_logging_with_config;

/// Load configuration from an optional TOML file and `SIM_CLOCK__*` environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<DemoConfig> {
    config::load_config(path).context("Failed to load demo configuration")
}
