//! Demo scenarios

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use sim_clock::{order, units, Callback, CallbackError, Clock, RunSummary};
use sim_network::{Group, Network, RunSpan};

/// Output lines collected from timer callbacks
type Lines = Arc<Mutex<Vec<String>>>;

/// Explicit period of the `every` timers in the ordering demo
pub const EVERY_PERIOD: f64 = 100.0 * units::MS;

fn announcer(lines: &Lines, label: &'static str) -> Callback {
    let lines = lines.clone();
    Callback::new(move |_clock: &mut Clock, time| {
        lines.lock().push(format!("{label} called at time {time:.3}"));
        Ok(())
    })
}

/// Five timers sharing one period, fired before, at and after the default order.
///
/// At every tick the sequence is timer 1, 4, 2, 3, 5: order first, then registration.
pub fn ordering_demo(clock: &mut Clock) -> Result<(RunSummary, Vec<String>)> {
    let lines = Lines::default();

    clock.tick(&announcer(&lines, "timer 2"))?;
    clock.before(&announcer(&lines, "timer 1"))?;
    clock.after(&announcer(&lines, "timer 3"))?;
    clock.every(EVERY_PERIOD, order::BEFORE, &announcer(&lines, "timer 4"))?;
    clock.every(EVERY_PERIOD, order::AFTER, &announcer(&lines, "timer 5"))?;

    let summary = clock.run(None, None, None)?;
    let lines = std::mem::take(&mut *lines.lock());
    Ok((summary, lines))
}

/// Unit relaxing towards a fixed target with time constant `tau`
pub struct LeakyUnit {
    name: String,
    index: usize,
    target: f64,
    tau: f64,
    value: f64,
    potentials: Arc<Mutex<Vec<f64>>>,
}

impl Group for LeakyUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self) -> Result<(), CallbackError> {
        self.value = 0.0;
        self.publish();
        Ok(())
    }

    fn evaluate(&mut self, dt: f64) -> Result<(), CallbackError> {
        self.value += dt * (self.target - self.value) / self.tau;
        if !self.value.is_finite() {
            return Err(format!("{} diverged", self.name).into());
        }
        self.publish();
        Ok(())
    }
}

impl LeakyUnit {
    fn publish(&self) {
        if let Some(slot) = self.potentials.lock().get_mut(self.index) {
            *slot = self.value;
        }
    }
}

/// Final state of a network demo run
#[derive(Debug, Clone)]
pub struct NetworkReport {
    pub summary: RunSummary,
    pub potentials: Vec<f64>,
    pub progress: Vec<String>,
}

/// Drive `units` leaky units through a network run, logging progress after each evaluation
pub fn network_demo(clock: &mut Clock, span: RunSpan, units: usize) -> Result<NetworkReport> {
    let potentials = Arc::new(Mutex::new(vec![0.0; units]));
    let network = Network::new();
    for index in 0..units {
        network.append(Box::new(LeakyUnit {
            name: format!("unit-{index}"),
            index,
            target: (index + 1) as f64,
            tau: 0.1 * (index + 1) as f64,
            value: 0.0,
            potentials: potentials.clone(),
        }))?;
    }

    let progress = Lines::default();
    let reporter = {
        let progress = progress.clone();
        let potentials = potentials.clone();
        Callback::new(move |_clock: &mut Clock, time| {
            let mean = {
                let values = potentials.lock();
                values.iter().sum::<f64>() / values.len().max(1) as f64
            };
            tracing::debug!(time, mean, "Network progress");
            progress.lock().push(format!("t={time:.3} mean={mean:.4}"));
            Ok(())
        })
    };
    clock.after(&reporter)?;

    let outcome = network.run(clock, span);
    clock.remove(&reporter, None);
    let summary = outcome?;

    let potentials = potentials.lock().clone();
    let progress = std::mem::take(&mut *progress.lock());
    Ok(NetworkReport { summary, potentials, progress })
}
