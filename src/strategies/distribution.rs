//! Distribution strategy - weighted random gremlin per step
//!
//! At every step one gremlin is sampled independently from the full set,
//! uniformly by default or following custom weights. The only built-in
//! strategy that needs the injected randomizer, and the default strategy
//! a horde falls back to when none is registered.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::callback::SharedCallback;
use crate::error::HordeError;
use crate::inject::{Inject, ServiceSlots};
use crate::sequencer::run_sequence;
use crate::services::{SharedLogger, SharedRandomizer};

use super::{pause, RunParams, Strategy, StrategyControl, StrategyState};

/// Tunables for [`Distribution`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Number of sampling steps; overridden by `RunParams::nb`
    pub steps: u64,
    /// Delay between consecutive steps
    pub delay: Duration,
    /// Per-gremlin selection weights, in registration order
    ///
    /// Expected to sum to 1; this is not validated, an incorrect sum
    /// skews selection probability but never fails. `None` means uniform.
    /// Entries beyond the gremlin count are ignored; gremlins without an
    /// entry weigh zero.
    pub weights: Option<Vec<f64>>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            delay: Duration::from_millis(10),
            weights: None,
        }
    }
}

/// Weighted-random scheduling: one sampled gremlin per step
pub struct Distribution {
    config: DistributionConfig,
    control: StrategyControl,
    slots: ServiceSlots,
}

impl Distribution {
    pub fn new(config: DistributionConfig) -> Self {
        Self {
            config,
            control: StrategyControl::new(),
            slots: ServiceSlots::new(),
        }
    }

    pub fn state(&self) -> StrategyState {
        self.control.state()
    }

    /// Effective weight per gremlin: the configured weights padded or
    /// truncated to the gremlin count, or a uniform share each
    fn weights_for(&self, count: usize) -> Vec<f64> {
        match &self.config.weights {
            Some(weights) => {
                let mut effective = vec![0.0; count];
                for (slot, weight) in effective.iter_mut().zip(weights) {
                    *slot = *weight;
                }
                effective
            }
            None => vec![1.0 / count as f64; count],
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::new(DistributionConfig::default())
    }
}

impl Inject for Distribution {
    fn logger(&self) -> Option<SharedLogger> {
        self.slots.logger()
    }

    fn set_logger(&self, logger: SharedLogger) {
        self.slots.set_logger(logger)
    }

    fn randomizer(&self) -> Option<SharedRandomizer> {
        self.slots.randomizer()
    }

    fn set_randomizer(&self, randomizer: SharedRandomizer) {
        self.slots.set_randomizer(randomizer)
    }
}

#[async_trait]
impl Strategy for Distribution {
    fn name(&self) -> &str {
        "distribution"
    }

    async fn attack(
        &self,
        gremlins: &[SharedCallback],
        params: &RunParams,
    ) -> Result<(), HordeError> {
        self.control.begin();
        let steps = params.nb.unwrap_or(self.config.steps);

        if steps == 0 || gremlins.is_empty() {
            self.control.finish();
            return Ok(());
        }

        let random = self.slots.require_randomizer(self.name())?;
        let weights = self.weights_for(gremlins.len());

        for step in 0..steps {
            if self.control.is_stopped() {
                debug!(step, "stop requested, ending steps");
                break;
            }
            // weights is non-empty here, the draw always lands
            let picked = random
                .weighted(&weights)
                .unwrap_or_default();
            debug!(step, gremlin = gremlins[picked].name(), "sampled gremlin");
            run_sequence(self.name(), std::slice::from_ref(&gremlins[picked])).await?;
            if step + 1 < steps {
                pause(self.config.delay).await;
            }
        }

        tokio::task::yield_now().await;
        self.control.finish();
        Ok(())
    }

    fn stop(&self) {
        self.control.stop();
    }
}
