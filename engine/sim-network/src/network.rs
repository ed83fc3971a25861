//! Network: the scheduler driver registered with a Clock

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sim_clock::{Callback, Clock, RunSummary};

use crate::error::{EvaluateError, NetworkError};
use crate::group::Group;
use crate::{DEFAULT_RUN_DT, DEFAULT_RUN_TIME};

type Groups = Arc<Mutex<Vec<Box<dyn Group>>>>;

/// How long a network run lasts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSpan {
    /// Run for `time` simulated seconds, evaluating every `dt`
    Duration { time: f64, dt: f64 },
    /// Run exactly `n` unit steps
    Steps(u64),
}

impl Default for RunSpan {
    fn default() -> Self {
        RunSpan::Duration { time: DEFAULT_RUN_TIME, dt: DEFAULT_RUN_DT }
    }
}

/// A set of groups evaluated together by one clock timer
pub struct Network {
    groups: Groups,
    evaluate: Callback,
}

impl Network {
    pub fn new() -> Self {
        let groups: Groups = Arc::new(Mutex::new(Vec::new()));
        let evaluate = {
            let groups = groups.clone();
            Callback::new(move |clock: &mut Clock, _time| {
                let dt = clock.resolution();
                for group in groups.lock().iter_mut() {
                    group.evaluate(dt).map_err(|source| EvaluateError {
                        name: group.name().to_string(),
                        source,
                    })?;
                }
                Ok(())
            })
        };

        Self { groups, evaluate }
    }

    /// Build a network from groups, rejecting duplicate names
    pub fn with_groups(groups: Vec<Box<dyn Group>>) -> Result<Self, NetworkError> {
        let network = Self::new();
        for group in groups {
            network.append(group)?;
        }
        Ok(network)
    }

    /// Add a group; fails if a group with the same name is already present
    pub fn append(&self, group: Box<dyn Group>) -> Result<(), NetworkError> {
        let mut groups = self.groups.lock();
        if groups.iter().any(|g| g.name() == group.name()) {
            return Err(NetworkError::GroupAlreadyPresent { name: group.name().to_string() });
        }

        tracing::debug!(group = group.name(), "Appending group to network");
        groups.push(group);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.lock().is_empty()
    }

    /// Group names in evaluation order
    pub fn group_names(&self) -> Vec<String> {
        self.groups.lock().iter().map(|g| g.name().to_string()).collect()
    }

    /// Set up every group in evaluation order
    pub fn setup(&self) -> Result<(), NetworkError> {
        for group in self.groups.lock().iter_mut() {
            group
                .setup()
                .map_err(|source| NetworkError::Setup { name: group.name().to_string(), source })?;
        }
        Ok(())
    }

    /// The callback this network registers with a clock
    pub fn evaluate_callback(&self) -> &Callback {
        &self.evaluate
    }

    /// Configure `clock` for `span`, set up the groups and run.
    ///
    /// The evaluate timer is removed and registered again at the clock's resolution, so
    /// repeated runs never fire it twice per tick.
    pub fn run(&self, clock: &mut Clock, span: RunSpan) -> Result<RunSummary, NetworkError> {
        match span {
            RunSpan::Duration { time, dt } => {
                clock.set_end(time)?;
                clock.set_resolution(dt)?;
            }
            RunSpan::Steps(n) => {
                clock.set_end(n as f64)?;
                clock.set_resolution(1.0)?;
            }
        }

        self.setup()?;
        clock.remove(&self.evaluate, None);
        clock.tick(&self.evaluate)?;

        tracing::info!(clock = %clock.id(), groups = self.len(), ?span, "Running network");
        Ok(clock.run(None, None, None)?)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
