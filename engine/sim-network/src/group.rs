//! Simulation component driven by a Network

use sim_clock::CallbackError;

/// A simulation component advanced once per network evaluation
pub trait Group: Send {
    /// Name identifying the group within its network
    fn name(&self) -> &str;

    /// Prepare the group before a run
    fn setup(&mut self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Advance the group by `dt` simulated seconds
    fn evaluate(&mut self, dt: f64) -> Result<(), CallbackError>;
}
