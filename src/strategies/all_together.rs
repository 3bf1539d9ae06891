//! All-together strategy - wave-synchronized full passes
//!
//! One wave invokes every registered gremlin once, in registration order,
//! through the sequencer. The next wave only starts after the whole wave
//! has completed and the configured delay has elapsed.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::callback::SharedCallback;
use crate::error::HordeError;
use crate::inject::Inject;
use crate::sequencer::run_sequence;

use super::{pause, RunParams, Strategy, StrategyControl, StrategyState};

/// Tunables for [`AllTogether`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllTogetherConfig {
    /// Number of waves to run; overridden by `RunParams::nb`
    pub waves: u64,
    /// Delay between consecutive waves
    pub delay: Duration,
}

impl Default for AllTogetherConfig {
    fn default() -> Self {
        Self {
            waves: 100,
            delay: Duration::from_millis(10),
        }
    }
}

/// Wave-synchronized scheduling: every gremlin once per wave
pub struct AllTogether {
    config: AllTogetherConfig,
    control: StrategyControl,
}

impl AllTogether {
    pub fn new(config: AllTogetherConfig) -> Self {
        Self {
            config,
            control: StrategyControl::new(),
        }
    }

    pub fn state(&self) -> StrategyState {
        self.control.state()
    }
}

impl Default for AllTogether {
    fn default() -> Self {
        Self::new(AllTogetherConfig::default())
    }
}

impl Inject for AllTogether {}

#[async_trait]
impl Strategy for AllTogether {
    fn name(&self) -> &str {
        "all-together"
    }

    async fn attack(
        &self,
        gremlins: &[SharedCallback],
        params: &RunParams,
    ) -> Result<(), HordeError> {
        self.control.begin();
        let waves = params.nb.unwrap_or(self.config.waves);

        if waves == 0 || gremlins.is_empty() {
            self.control.finish();
            return Ok(());
        }

        for wave in 0..waves {
            if self.control.is_stopped() {
                debug!(wave, "stop requested, ending waves");
                break;
            }
            debug!(wave, gremlins = gremlins.len(), "starting wave");
            run_sequence(self.name(), gremlins).await?;
            if wave + 1 < waves {
                pause(self.config.delay).await;
            }
        }

        // One deferred tick before completion, so an in-flight stop has
        // settled by the time the caller observes the resolution.
        tokio::task::yield_now().await;
        self.control.finish();
        Ok(())
    }

    fn stop(&self) {
        self.control.stop();
    }
}
