//! Configuration for the Clock

use crate::error::ClockError;
use crate::{DEFAULT_END, DEFAULT_EPSILON, DEFAULT_RESOLUTION, DEFAULT_START};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the Clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Simulated start time in seconds
    pub start: f64,

    /// Simulated end time in seconds
    pub end: f64,

    /// Step between two ticks in seconds
    pub resolution: f64,

    /// Slack below which a timer is considered to sit on the next tick boundary
    pub epsilon: f64,

    /// Whether a timer due exactly at `end` fires
    pub end_boundary: EndBoundary,

    /// Abort the run if a single tick fires more timers than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_firings_per_tick: Option<usize>,
}

/// How the run loop treats a timer due exactly at the end time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBoundary {
    /// Timers fire for `start <= t < end`
    #[default]
    Exclusive,
    /// Timers fire for `start <= t <= end`
    Inclusive,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
            resolution: DEFAULT_RESOLUTION,
            epsilon: DEFAULT_EPSILON,
            end_boundary: EndBoundary::Exclusive,
            max_firings_per_tick: None,
        }
    }
}

impl ClockConfig {
    /// Config spanning `[start, end]` with the given resolution, other fields defaulted
    pub fn with_span(start: f64, end: f64, resolution: f64) -> Self {
        Self { start, end, resolution, ..Default::default() }
    }

    /// Check bounds, resolution and tolerance
    pub fn validate(&self) -> Result<(), ClockError> {
        if !self.start.is_finite() || !self.end.is_finite() || self.end < self.start {
            return Err(ClockError::InvalidBounds { start: self.start, end: self.end });
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ClockError::InvalidResolution { resolution: self.resolution });
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ClockError::Config(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        if self.max_firings_per_tick == Some(0) {
            return Err(ClockError::Config("max_firings_per_tick must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClockError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClockError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: ClockConfig = toml::from_str(&content)
            .map_err(|e| ClockError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ClockError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClockError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| ClockError::Config(format!("failed to write {}: {e}", path.display())))?;
        Ok(())
    }
}
