//! Crate-level tests for the Clock: configuration, errors, metrics and scheduling properties

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EndBoundary;
use crate::{
    Callback, Clock, ClockConfig, ClockError, MetricsCollector, DEFAULT_END, DEFAULT_EPSILON,
    DEFAULT_RESOLUTION, DEFAULT_START,
};

fn create_test_config() -> ClockConfig {
    ClockConfig {
        start: 0.0,
        end: 2.0,
        resolution: 0.01,
        epsilon: 1e-9,
        end_boundary: EndBoundary::Inclusive,
        max_firings_per_tick: Some(64),
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_clock_config_default() {
        let config = ClockConfig::default();
        assert_eq!(config.start, DEFAULT_START);
        assert_eq!(config.end, DEFAULT_END);
        assert_eq!(config.resolution, DEFAULT_RESOLUTION);
        assert_eq!(config.epsilon, DEFAULT_EPSILON);
        assert_eq!(config.end_boundary, EndBoundary::Exclusive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ClockConfig { end: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ClockError::InvalidBounds { .. })));

        let config = ClockConfig { resolution: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ClockError::InvalidResolution { .. })));

        let config = ClockConfig { epsilon: -1.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ClockError::Config(_))));

        let config = ClockConfig { max_firings_per_tick: Some(0), ..Default::default() };
        assert!(matches!(config.validate(), Err(ClockError::Config(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = create_test_config();

        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: ClockConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClockConfig = toml::from_str("end = 5.0\nend_boundary = \"inclusive\"").unwrap();
        assert_eq!(config.end, 5.0);
        assert_eq!(config.end_boundary, EndBoundary::Inclusive);
        assert_eq!(config.resolution, DEFAULT_RESOLUTION);
        assert_eq!(config.max_firings_per_tick, None);
    }

    #[test]
    fn test_config_file_operations() {
        let config = create_test_config();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clock.toml");

        config.to_file(&path).unwrap();
        let loaded = ClockConfig::from_file(&path).unwrap();
        assert_eq!(config, loaded);

        let clock = Clock::from_config(&loaded).unwrap();
        assert_eq!(clock.config(), config);
    }

    #[test]
    fn test_config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(ClockConfig::from_file(&missing), Err(ClockError::Config(_))));

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "start = 3.0\nend = 1.0\n").unwrap();
        assert!(matches!(ClockConfig::from_file(&invalid), Err(ClockError::InvalidBounds { .. })));
    }
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_clock_error_display() {
        let error = ClockError::ConfigConflict { operation: "reset" };
        assert_eq!(error.to_string(), "Cannot reset while the clock is running");
        assert!(error.is_config_conflict());

        let error = ClockError::InvalidBounds { start: 2.0, end: 1.0 };
        assert!(error.to_string().contains("end (1)"));

        let error = ClockError::RunawayTick { time: 0.5, firings: 11 };
        assert!(error.to_string().contains("11 firings"));
        assert!(!error.is_config_conflict());
    }

    #[test]
    fn test_callback_error_keeps_source() {
        use std::error::Error;

        let source: crate::CallbackError = anyhow::anyhow!("model diverged").into();
        let error = ClockError::Callback { time: 0.25, source };
        assert!(error.to_string().contains("0.25"));
        assert_eq!(error.source().map(|s| s.to_string()), Some("model diverged".to_string()));
    }

    #[test]
    fn test_anyhow_errors_propagate_from_callbacks() {
        let mut clock = Clock::new(0.0, 1.0, 0.5).unwrap();
        let cb = Callback::new(|_, _| {
            let value: u32 = "not a number".parse().map_err(anyhow::Error::from)?;
            assert_eq!(value, 0);
            Ok(())
        });
        clock.tick(&cb).unwrap();

        let err = clock.run(None, None, None).unwrap_err();
        assert!(matches!(err, ClockError::Callback { time, .. } if time == 0.0));
    }
}

#[cfg(test)]
mod metrics_tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        let metrics = collector.get_metrics();

        assert_eq!(metrics.total_ticks, 0);
        assert_eq!(metrics.total_firings, 0);
        assert_eq!(metrics.runs_completed, 0);
    }

    #[test]
    fn test_metrics_recording() {
        let collector = MetricsCollector::new();

        collector.record_tick(0.0, 3);
        collector.record_tick(0.1, 7);
        collector.record_firing();
        collector.record_run(true);
        collector.update_registered_timers(4);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_ticks, 2);
        assert_eq!(metrics.max_firings_per_tick, 7);
        assert_eq!(metrics.total_firings, 1);
        assert_eq!(metrics.runs_completed, 1);
        assert_eq!(metrics.runs_stopped, 1);
        assert_eq!(metrics.registered_timers, 4);
    }

    #[test]
    fn test_metrics_reset() {
        let collector = MetricsCollector::new();

        collector.record_tick(0.0, 2);
        collector.record_callback_failure();
        collector.update_registered_timers(3);

        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_ticks, 0);
        assert_eq!(metrics.callback_failures, 0);
        assert_eq!(metrics.registered_timers, 3);
    }

    #[test]
    fn test_clock_reports_run_metrics() {
        let mut clock = Clock::new(0.0, 1.0, 0.1).unwrap();
        let collector = clock.metrics_collector();
        clock.tick(&Callback::new(|_, _| Ok(()))).unwrap();
        clock.every(0.5, 0, &Callback::new(|_, _| Ok(()))).unwrap();

        clock.run(None, None, None).unwrap();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_firings, 12);
        assert_eq!(metrics.total_ticks, 11);
        assert_eq!(metrics.runs_completed, 1);
        assert_eq!(metrics.runs_stopped, 0);
        assert_eq!(metrics.registered_timers, 2);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    type Trace = Arc<Mutex<Vec<(usize, f64)>>>;

    /// Register one recording timer per `(period_steps, order)` with periods in
    /// multiples of a binary-exact resolution
    fn build_clock(resolution: f64, end_steps: u32, timers: &[(u32, i32)], trace: &Trace) -> Clock {
        let mut clock = Clock::new(0.0, end_steps as f64 * resolution, resolution).unwrap();
        for (index, (period_steps, order)) in timers.iter().enumerate() {
            let trace = trace.clone();
            let cb = Callback::new(move |_, time| {
                trace.lock().push((index, time));
                Ok(())
            });
            clock.add(&cb, Some(*period_steps as f64 * resolution), *order).unwrap();
        }
        clock
    }

    fn timer_layouts() -> impl Strategy<Value = Vec<(u32, i32)>> {
        prop::collection::vec((1u32..8, -2i32..3), 1..6)
    }

    proptest! {
        #[test]
        fn prop_fire_count_matches_exclusive_boundary(
            end_steps in 1u32..64,
            timers in timer_layouts(),
        ) {
            let trace = Trace::default();
            let mut clock = build_clock(0.125, end_steps, &timers, &trace);
            clock.run(None, None, None).unwrap();

            let trace = trace.lock();
            for (index, (period_steps, _)) in timers.iter().enumerate() {
                let count = trace.iter().filter(|(i, _)| *i == index).count() as u32;
                prop_assert_eq!(count, end_steps.div_ceil(*period_steps));
            }
        }

        #[test]
        fn prop_runs_are_deterministic(
            end_steps in 1u32..48,
            timers in timer_layouts(),
        ) {
            let first = Trace::default();
            build_clock(0.125, end_steps, &timers, &first).run(None, None, None).unwrap();
            let second = Trace::default();
            build_clock(0.125, end_steps, &timers, &second).run(None, None, None).unwrap();

            prop_assert_eq!(&*first.lock(), &*second.lock());
        }

        #[test]
        fn prop_firing_sequence_is_ordered(
            end_steps in 1u32..48,
            timers in timer_layouts(),
        ) {
            let trace = Trace::default();
            build_clock(0.125, end_steps, &timers, &trace).run(None, None, None).unwrap();

            let trace = trace.lock();
            for pair in trace.windows(2) {
                let (a, ta) = pair[0];
                let (b, tb) = pair[1];
                prop_assert!(ta <= tb);
                if ta == tb {
                    prop_assert!((timers[a].1, a) < (timers[b].1, b));
                }
            }
        }
    }
}
