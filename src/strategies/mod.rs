//! Scheduling strategies - order, repetition, and timing of gremlin runs
//!
//! A strategy drives the attack phase: it decides which gremlins run,
//! how many times, and with what delay between steps. All strategies
//! share the state machine Idle -> Running -> (Stopped | Completed),
//! where Idle is re-enterable so one instance can serve several runs.
//!
//! Cancellation is cooperative: `stop()` only prevents the next step from
//! starting. Work already dispatched for the current step completes
//! normally, then the attack future resolves after one deferred tick -
//! exactly once, whether the run finished naturally or was stopped.

mod all_together;
mod by_species;
mod distribution;

pub use all_together::{AllTogether, AllTogetherConfig};
pub use by_species::{BySpecies, BySpeciesConfig};
pub use distribution::{Distribution, DistributionConfig};

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::callback::SharedCallback;
use crate::error::HordeError;
use crate::inject::Inject;

/// Parameters for one run, passed unchanged to every strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunParams {
    /// Repetition count override: waves, per-gremlin repetitions, or steps
    /// depending on the strategy. Each strategy falls back to its own
    /// configured default when absent.
    #[serde(default)]
    pub nb: Option<u64>,
}

impl RunParams {
    /// Override the repetition count for this run
    pub fn with_nb(nb: u64) -> Self {
        Self { nb: Some(nb) }
    }
}

/// A pluggable scheduling policy for the attack phase
#[async_trait]
pub trait Strategy: Inject {
    /// Name used in logs and missing-service errors
    fn name(&self) -> &str;

    /// Drive the attack phase over a snapshot of the gremlin registry
    ///
    /// Strategies never mutate the list they receive, so repeated runs
    /// stay independent. Resolves exactly once, after the run finishes
    /// naturally or a `stop` takes effect.
    async fn attack(
        &self,
        gremlins: &[SharedCallback],
        params: &RunParams,
    ) -> Result<(), HordeError>;

    /// Request a cooperative stop
    ///
    /// Only effective while the strategy is running; the current step
    /// still completes, no further step starts. Calling before a run or
    /// after completion is a no-op, as is calling it repeatedly.
    fn stop(&self);
}

/// Run state of a strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyState {
    #[default]
    Idle,
    Running,
    Stopped,
    Completed,
}

/// State machine shared by the built-in strategies
#[derive(Default)]
pub struct StrategyControl {
    state: RwLock<StrategyState>,
}

impl StrategyControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter Running; valid from any state so instances are reusable
    pub fn begin(&self) {
        *self.state.write() = StrategyState::Running;
    }

    /// Running -> Stopped; returns whether the transition happened
    pub fn stop(&self) -> bool {
        let mut state = self.state.write();
        if *state == StrategyState::Running {
            *state = StrategyState::Stopped;
            true
        } else {
            false
        }
    }

    /// Whether a stop has been requested for the current run
    pub fn is_stopped(&self) -> bool {
        *self.state.read() == StrategyState::Stopped
    }

    /// Natural completion: Running -> Completed; a stop that already
    /// landed keeps the Stopped state
    pub fn finish(&self) {
        let mut state = self.state.write();
        if *state == StrategyState::Running {
            *state = StrategyState::Completed;
        }
    }

    pub fn state(&self) -> StrategyState {
        *self.state.read()
    }
}

/// Delay between steps; zero means no reschedule at all
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
