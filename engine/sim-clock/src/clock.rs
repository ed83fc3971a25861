//! Core Clock implementation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ClockConfig, EndBoundary};
use crate::error::ClockError;
use crate::metrics::{ClockMetrics, MetricsCollector};
use crate::order;
use crate::timer::{Callback, Timer, TimerHandle, TimerId, TimerInfo};

static NEXT_CLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique clock identifier, carried by timers for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockId(u64);

impl ClockId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clock#{}", self.0)
    }
}

/// Outcome of a single call to [`Clock::run`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks advanced by this run
    pub ticks: u64,
    /// Timers fired by this run
    pub fired: u64,
    /// Whether the run ended because `stop` was called
    pub stopped: bool,
    /// Simulated time when the run returned
    pub time: f64,
}

/// The Clock - owns simulated time and the ordered timer collection
#[derive(Debug)]
pub struct Clock {
    id: ClockId,

    // Bounds and step
    start: f64,
    end: f64,
    resolution: f64,
    epsilon: f64,
    end_boundary: EndBoundary,
    max_firings_per_tick: Option<usize>,

    // Run state
    ticks: u64,
    running: bool,
    firing_at: Option<f64>,
    stopped_at: Option<f64>,

    // Timers, sorted by (next_fire_time, order, id)
    timers: Vec<Timer>,
    next_timer_id: u64,

    metrics: Arc<MetricsCollector>,
}

impl Clock {
    /// Create a new Clock over `[start, end]` stepping by `resolution`
    pub fn new(start: f64, end: f64, resolution: f64) -> Result<Self, ClockError> {
        Self::from_config(&ClockConfig::with_span(start, end, resolution))
    }

    /// Create a new Clock from a validated configuration
    pub fn from_config(config: &ClockConfig) -> Result<Self, ClockError> {
        config.validate()?;

        let id = ClockId::next();
        tracing::debug!(
            clock = %id,
            start = config.start,
            end = config.end,
            resolution = config.resolution,
            "Creating Clock"
        );

        Ok(Self {
            id,
            start: config.start,
            end: config.end,
            resolution: config.resolution,
            epsilon: config.epsilon,
            end_boundary: config.end_boundary,
            max_firings_per_tick: config.max_firings_per_tick,
            ticks: 0,
            running: false,
            firing_at: None,
            stopped_at: None,
            timers: Vec::new(),
            next_timer_id: 0,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    pub fn id(&self) -> ClockId {
        self.id
    }

    /// Current simulated time
    pub fn time(&self) -> f64 {
        self.time_at(self.ticks)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Step between two ticks
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn end_boundary(&self) -> EndBoundary {
        self.end_boundary
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether simulated time has moved past `end`
    pub fn is_finished(&self) -> bool {
        !self.within_end(self.time())
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Registered timers in firing order
    pub fn timers(&self) -> Vec<TimerInfo> {
        self.timers.iter().map(Timer::info).collect()
    }

    /// Current configuration of this clock
    pub fn config(&self) -> ClockConfig {
        ClockConfig {
            start: self.start,
            end: self.end,
            resolution: self.resolution,
            epsilon: self.epsilon,
            end_boundary: self.end_boundary,
            max_firings_per_tick: self.max_firings_per_tick,
        }
    }

    pub fn metrics(&self) -> ClockMetrics {
        self.metrics.get_metrics()
    }

    /// Shared handle to the metrics collector, readable from other threads
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Register a timer.
    ///
    /// `period` defaults to the current resolution. The timer is first due at `start`,
    /// even when added mid-run, so it stays in phase with the epoch.
    pub fn add(
        &mut self,
        callback: &Callback,
        period: Option<f64>,
        order: i32,
    ) -> Result<TimerHandle, ClockError> {
        let period = period.unwrap_or(self.resolution);
        if !period.is_finite() || period <= 0.0 {
            return Err(ClockError::InvalidPeriod { period });
        }

        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.timers.push(Timer::new(id, callback.clone(), period, order, self.start, self.id));
        self.sort_timers();
        self.metrics.update_registered_timers(self.timers.len());

        tracing::debug!(clock = %self.id, timer = %id, period, order, "Registered timer");
        Ok(TimerHandle { id, period })
    }

    /// Register a timer at the default period and order
    pub fn tick(&mut self, callback: &Callback) -> Result<TimerHandle, ClockError> {
        self.add(callback, None, order::DEFAULT)
    }

    /// Register a timer at the default period, firing just before default-order timers
    pub fn before(&mut self, callback: &Callback) -> Result<TimerHandle, ClockError> {
        self.add(callback, None, order::BEFORE)
    }

    /// Register a timer at the default period, firing just after default-order timers
    pub fn after(&mut self, callback: &Callback) -> Result<TimerHandle, ClockError> {
        self.add(callback, None, order::AFTER)
    }

    /// Register a timer with an explicit period
    pub fn every(
        &mut self,
        period: f64,
        order: i32,
        callback: &Callback,
    ) -> Result<TimerHandle, ClockError> {
        self.add(callback, Some(period), order)
    }

    /// Remove at most one timer registered as `(callback, period)`.
    ///
    /// `period` defaults to the current resolution. A miss is not an error; the return
    /// value tells whether a timer was removed.
    pub fn remove(&mut self, callback: &Callback, period: Option<f64>) -> bool {
        let period = period.unwrap_or(self.resolution);
        match self.timers.iter().position(|timer| timer.matches(callback, period)) {
            Some(index) => self.remove_at(index),
            None => false,
        }
    }

    /// Remove the timer a registration returned. No-op if it is already gone.
    pub fn remove_timer(&mut self, handle: TimerHandle) -> bool {
        match self.timers.iter().position(|timer| timer.id() == handle.id) {
            Some(index) => self.remove_at(index),
            None => false,
        }
    }

    fn remove_at(&mut self, index: usize) -> bool {
        let timer = self.timers.remove(index);
        self.metrics.update_registered_timers(self.timers.len());
        tracing::debug!(clock = %self.id, timer = %timer.id(), period = timer.period(), "Removed timer");
        true
    }

    /// Discard all timers
    pub fn clear(&mut self) {
        self.timers.clear();
        self.metrics.update_registered_timers(0);
        tracing::debug!(clock = %self.id, "Cleared timers");
    }

    /// Rewind time and every timer to `start`
    pub fn reset(&mut self) -> Result<(), ClockError> {
        self.ensure_stopped("reset")?;

        self.ticks = 0;
        let start = self.start;
        for timer in &mut self.timers {
            timer.rewind(start);
        }
        self.sort_timers();

        tracing::debug!(clock = %self.id, start, "Reset clock");
        Ok(())
    }

    /// Change the resolution.
    ///
    /// Resets the clock; timers whose period equalled the previous resolution follow
    /// the new one, timers with their own period keep it.
    pub fn set_resolution(&mut self, resolution: f64) -> Result<(), ClockError> {
        self.ensure_stopped("set resolution")?;
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(ClockError::InvalidResolution { resolution });
        }

        let previous = self.resolution;
        self.resolution = resolution;
        self.reset()?;
        for timer in &mut self.timers {
            if timer.period() == previous {
                timer.set_period(resolution);
            }
        }
        self.sort_timers();

        tracing::debug!(clock = %self.id, previous, resolution, "Changed resolution");
        Ok(())
    }

    pub fn set_start(&mut self, start: f64) -> Result<(), ClockError> {
        self.set_bounds(start, self.end)
    }

    pub fn set_end(&mut self, end: f64) -> Result<(), ClockError> {
        self.set_bounds(self.start, end)
    }

    /// Set both bounds at once, then reset
    pub fn set_bounds(&mut self, start: f64, end: f64) -> Result<(), ClockError> {
        self.ensure_stopped("set bounds")?;
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(ClockError::InvalidBounds { start, end });
        }

        self.start = start;
        self.end = end;
        self.reset()
    }

    /// Change the tick-boundary tolerance
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), ClockError> {
        self.ensure_stopped("set epsilon")?;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(ClockError::Config(format!(
                "epsilon must be finite and non-negative, got {epsilon}"
            )));
        }
        self.epsilon = epsilon;
        self.sort_timers();
        Ok(())
    }

    /// Request the run loop to stop.
    ///
    /// Observed between firings: the callback calling `stop` completes, timers due at
    /// the same simulated instant still fire, nothing later does.
    pub fn stop(&mut self) {
        if self.running {
            self.stopped_at = self.firing_at;
            tracing::debug!(clock = %self.id, time = self.time(), "Stop requested");
        }
        self.running = false;
    }

    /// Run the clock until time passes `end` or `stop` is called.
    ///
    /// Supplied arguments replace the current bounds or resolution (which resets the
    /// clock); omitted ones keep their value. Without overrides a finished clock is not
    /// rewound, so running it again fires nothing. `running` is false when this returns.
    pub fn run(
        &mut self,
        start: Option<f64>,
        end: Option<f64>,
        resolution: Option<f64>,
    ) -> Result<RunSummary, ClockError> {
        if self.running {
            return Err(ClockError::AlreadyRunning);
        }
        if start.is_some() || end.is_some() {
            self.set_bounds(start.unwrap_or(self.start), end.unwrap_or(self.end))?;
        }
        if let Some(resolution) = resolution {
            self.set_resolution(resolution)?;
        }

        tracing::info!(
            clock = %self.id,
            time = self.time(),
            end = self.end,
            resolution = self.resolution,
            timers = self.timers.len(),
            "Starting Clock run loop"
        );

        self.running = true;
        self.stopped_at = None;
        let mut summary = RunSummary::default();
        let result = self.run_loop(&mut summary);
        self.running = false;
        self.firing_at = None;
        self.stopped_at = None;
        summary.time = self.time();

        match result {
            Ok(()) => {
                self.metrics.record_run(summary.stopped);
                tracing::info!(
                    clock = %self.id,
                    time = summary.time,
                    ticks = summary.ticks,
                    fired = summary.fired,
                    stopped = summary.stopped,
                    "Clock run loop finished"
                );
                Ok(summary)
            }
            Err(e) => {
                if matches!(e, ClockError::Callback { .. }) {
                    self.metrics.record_callback_failure();
                }
                tracing::warn!(clock = %self.id, time = summary.time, error = %e, "Clock run loop aborted");
                Err(e)
            }
        }
    }

    fn run_loop(&mut self, summary: &mut RunSummary) -> Result<(), ClockError> {
        if self.timers.is_empty() {
            let skipped = self.ticks_past_end().saturating_sub(self.ticks);
            self.ticks += skipped;
            summary.ticks = skipped;
            self.metrics.record_idle_ticks(self.time(), skipped);
            return Ok(());
        }

        while self.running && self.within_end(self.time()) {
            let fired = self.drain_tick()?;
            summary.fired += fired as u64;

            self.metrics.record_tick(self.time(), fired);
            self.ticks += 1;
            summary.ticks += 1;
        }

        summary.stopped = !self.running;
        Ok(())
    }

    /// Fire every timer due within the current tick, earliest first
    fn drain_tick(&mut self) -> Result<usize, ClockError> {
        let tick_end = self.time_at(self.ticks + 1);
        let mut fired = 0usize;

        // Re-derive the head on every pass: callbacks may add, remove or clear timers.
        while let Some(next) = self.timers.first().map(Timer::next_fire_time) {
            if next >= tick_end {
                break;
            }
            if !self.running && !self.is_stop_instant(next) {
                break;
            }
            if !self.fires_before_end(next) || tick_end - next <= self.epsilon {
                break;
            }

            self.fire_head(next)?;
            fired += 1;

            if let Some(limit) = self.max_firings_per_tick {
                if fired > limit {
                    tracing::error!(clock = %self.id, time = self.time(), fired, limit, "Runaway tick");
                    return Err(ClockError::RunawayTick { time: self.time(), firings: fired });
                }
            }
        }

        Ok(fired)
    }

    fn fire_head(&mut self, time: f64) -> Result<(), ClockError> {
        let (id, callback) = {
            let head = &self.timers[0];
            (head.id(), head.callback().clone())
        };

        tracing::trace!(clock = %self.id, timer = %id, time, "Firing timer");
        self.firing_at = Some(time);
        let result = callback.call(self, time);
        self.firing_at = None;

        if let Err(source) = result {
            tracing::error!(clock = %self.id, timer = %id, time, "Timer callback failed: {}", source);
            return Err(ClockError::Callback { time, source });
        }

        if let Some(timer) = self.timers.iter_mut().find(|timer| timer.id() == id) {
            timer.advance();
        }
        self.sort_timers();
        self.metrics.record_firing();
        Ok(())
    }

    fn sort_timers(&mut self) {
        let epsilon = self.epsilon;
        self.timers.sort_by(|a, b| a.schedule_cmp(b, epsilon));
    }

    fn ensure_stopped(&self, operation: &'static str) -> Result<(), ClockError> {
        if self.running {
            return Err(ClockError::ConfigConflict { operation });
        }
        Ok(())
    }

    fn time_at(&self, ticks: u64) -> f64 {
        self.start + ticks as f64 * self.resolution
    }

    fn within_end(&self, time: f64) -> bool {
        time <= self.end + self.epsilon
    }

    fn fires_before_end(&self, time: f64) -> bool {
        match self.end_boundary {
            EndBoundary::Exclusive => time < self.end - self.epsilon,
            EndBoundary::Inclusive => time <= self.end + self.epsilon,
        }
    }

    fn is_stop_instant(&self, time: f64) -> bool {
        self.stopped_at.is_some_and(|at| (time - at).abs() <= self.epsilon)
    }

    /// First tick count whose time lies past `end`
    fn ticks_past_end(&self) -> u64 {
        let span = (self.end - self.start).max(0.0);
        let mut ticks = (span / self.resolution).floor() as u64;
        while self.within_end(self.time_at(ticks)) {
            ticks += 1;
        }
        ticks
    }
}
