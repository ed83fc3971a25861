//! Metrics collection for the Clock

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the counters kept by a [`MetricsCollector`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockMetrics {
    /// Ticks advanced over the lifetime of the clock
    pub total_ticks: u64,

    /// Timer firings over the lifetime of the clock
    pub total_firings: u64,

    /// Calls to `run` that returned
    pub runs_completed: u64,

    /// Runs that ended because `stop` was called
    pub runs_stopped: u64,

    /// Runs aborted by a failing callback
    pub callback_failures: u64,

    /// Most firings observed within a single tick
    pub max_firings_per_tick: u64,

    /// Timers registered when the snapshot was taken
    pub registered_timers: u64,
}

/// Metrics collector for the Clock.
///
/// Counters are atomics so a shared handle can be read while the clock runs on
/// another thread. Every update is also forwarded to the `metrics` facade.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_ticks: AtomicU64,
    total_firings: AtomicU64,
    runs_completed: AtomicU64,
    runs_stopped: AtomicU64,
    callback_failures: AtomicU64,
    max_firings_per_tick: AtomicU64,
    registered_timers: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed tick and the number of timers it fired
    pub fn record_tick(&self, time: f64, firings: usize) {
        let firings = firings as u64;
        self.total_ticks.fetch_add(1, Ordering::Relaxed);
        self.max_firings_per_tick.fetch_max(firings, Ordering::Relaxed);

        metrics::increment_counter!("sim_clock_ticks_total");
        metrics::gauge!("sim_clock_time_seconds", time);
    }

    /// Record ticks skipped over without any timer to fire
    pub fn record_idle_ticks(&self, time: f64, ticks: u64) {
        self.total_ticks.fetch_add(ticks, Ordering::Relaxed);

        metrics::counter!("sim_clock_ticks_total", ticks);
        metrics::gauge!("sim_clock_time_seconds", time);
    }

    /// Record one timer firing
    pub fn record_firing(&self) {
        self.total_firings.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!("sim_clock_firings_total");
    }

    /// Record the end of a run
    pub fn record_run(&self, stopped: bool) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        if stopped {
            self.runs_stopped.fetch_add(1, Ordering::Relaxed);
            metrics::increment_counter!("sim_clock_runs_total", "outcome" => "stopped");
        } else {
            metrics::increment_counter!("sim_clock_runs_total", "outcome" => "completed");
        }
    }

    /// Record a run aborted by a failing callback
    pub fn record_callback_failure(&self) {
        self.callback_failures.fetch_add(1, Ordering::Relaxed);
        metrics::increment_counter!("sim_clock_runs_total", "outcome" => "failed");
    }

    /// Update registered timer count
    pub fn update_registered_timers(&self, count: usize) {
        self.registered_timers.store(count as u64, Ordering::Relaxed);
        metrics::gauge!("sim_clock_registered_timers", count as f64);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> ClockMetrics {
        ClockMetrics {
            total_ticks: self.total_ticks.load(Ordering::Relaxed),
            total_firings: self.total_firings.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_stopped: self.runs_stopped.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            max_firings_per_tick: self.max_firings_per_tick.load(Ordering::Relaxed),
            registered_timers: self.registered_timers.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters except the registered timer gauge
    pub fn reset(&self) {
        self.total_ticks.store(0, Ordering::Relaxed);
        self.total_firings.store(0, Ordering::Relaxed);
        self.runs_completed.store(0, Ordering::Relaxed);
        self.runs_stopped.store(0, Ordering::Relaxed);
        self.callback_failures.store(0, Ordering::Relaxed);
        self.max_firings_per_tick.store(0, Ordering::Relaxed);
    }
}
