//! Demo configuration management

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sim_clock::ClockConfig;
use std::path::Path;

/// Prefix of environment overrides, e.g. `SIM_CLOCK__CLOCK__END=2.0`
pub const ENV_PREFIX: &str = "SIM_CLOCK";

/// Main demo configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Clock configuration
    pub clock: ClockConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, json, pretty)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and print its exposition after the run
    pub prometheus: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from an optional file, then environment variables
pub fn load_config(path: Option<&Path>) -> Result<DemoConfig> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(::config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .context("Failed to read configuration sources")?;

    let config: DemoConfig =
        settings.try_deserialize().context("Failed to deserialize configuration")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &DemoConfig) -> Result<()> {
    config.clock.validate().context("Invalid clock configuration")?;

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "compact" | "json" | "pretty" => {}
        _ => return Err(anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}

/// Render configuration as TOML
pub fn to_toml(config: &DemoConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}
