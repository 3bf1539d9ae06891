//! By-species strategy - sequential per-gremlin blocks
//!
//! Exhausts one gremlin completely before moving to the next in
//! registration order. Useful for isolating a single action's behavior
//! over time.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::callback::SharedCallback;
use crate::error::HordeError;
use crate::inject::Inject;
use crate::sequencer::run_sequence;

use super::{pause, RunParams, Strategy, StrategyControl, StrategyState};

/// Tunables for [`BySpecies`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BySpeciesConfig {
    /// Invocations per gremlin before moving on; overridden by
    /// `RunParams::nb`
    pub repetitions: u64,
    /// Delay between consecutive invocations
    pub delay: Duration,
}

impl Default for BySpeciesConfig {
    fn default() -> Self {
        Self {
            repetitions: 200,
            delay: Duration::from_millis(10),
        }
    }
}

/// Sequential-block scheduling: one gremlin at a time, to exhaustion
pub struct BySpecies {
    config: BySpeciesConfig,
    control: StrategyControl,
}

impl BySpecies {
    pub fn new(config: BySpeciesConfig) -> Self {
        Self {
            config,
            control: StrategyControl::new(),
        }
    }

    pub fn state(&self) -> StrategyState {
        self.control.state()
    }
}

impl Default for BySpecies {
    fn default() -> Self {
        Self::new(BySpeciesConfig::default())
    }
}

impl Inject for BySpecies {}

#[async_trait]
impl Strategy for BySpecies {
    fn name(&self) -> &str {
        "by-species"
    }

    async fn attack(
        &self,
        gremlins: &[SharedCallback],
        params: &RunParams,
    ) -> Result<(), HordeError> {
        self.control.begin();
        let repetitions = params.nb.unwrap_or(self.config.repetitions);

        if repetitions == 0 || gremlins.is_empty() {
            self.control.finish();
            return Ok(());
        }

        'species: for (species, gremlin) in gremlins.iter().enumerate() {
            debug!(gremlin = gremlin.name(), repetitions, "exhausting species");
            for repetition in 0..repetitions {
                if self.control.is_stopped() {
                    debug!(gremlin = gremlin.name(), "stop requested, ending run");
                    break 'species;
                }
                run_sequence(self.name(), std::slice::from_ref(gremlin)).await?;
                // Delay separates invocations, the last one pays none
                if repetition + 1 < repetitions || species + 1 < gremlins.len() {
                    pause(self.config.delay).await;
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::TraceCallback;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn instant(repetitions: u64) -> BySpecies {
        BySpecies::new(BySpeciesConfig {
            repetitions,
            delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_each_gremlin_is_exhausted_in_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let gremlins = vec![
            TraceCallback::shared("g1", &trace),
            TraceCallback::shared("g2", &trace),
        ];

        let strategy = instant(200);
        strategy
            .attack(&gremlins, &RunParams::with_nb(2))
            .await
            .unwrap();

        assert_eq!(*trace.lock(), vec!["g1", "g1", "g2", "g2"]);
        assert_eq!(strategy.state(), StrategyState::Completed);
    }

    #[tokio::test]
    async fn test_zero_repetitions_completes_immediately() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let gremlins = vec![TraceCallback::shared("g1", &trace)];

        let strategy = instant(0);
        strategy.attack(&gremlins, &RunParams::default()).await.unwrap();

        assert!(trace.lock().is_empty());
        assert_eq!(strategy.state(), StrategyState::Completed);
    }

    #[tokio::test]
    async fn test_no_delay_after_final_invocation() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let gremlins = vec![
            TraceCallback::shared("g1", &trace),
            TraceCallback::shared("g2", &trace),
        ];

        let strategy = BySpecies::new(BySpeciesConfig {
            repetitions: 1,
            delay: Duration::from_millis(200),
        });

        let started = std::time::Instant::now();
        strategy
            .attack(&gremlins, &RunParams::default())
            .await
            .unwrap();

        // One delay between the two species, none after the last run
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(400));
        assert_eq!(*trace.lock(), vec!["g1", "g2"]);
    }

    #[tokio::test]
    async fn test_stop_skips_remaining_species() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let gremlins = vec![
            TraceCallback::shared("g1", &trace),
            TraceCallback::shared("g2", &trace),
        ];

        let strategy = Arc::new(BySpecies::new(BySpeciesConfig {
            repetitions: 10_000,
            delay: Duration::from_millis(2),
        }));

        let running = Arc::clone(&strategy);
        let list = gremlins.clone();
        let handle =
            tokio::spawn(async move { running.attack(&list, &RunParams::default()).await });

        tokio::time::sleep(Duration::from_millis(15)).await;
        strategy.stop();

        handle.await.unwrap().unwrap();
        let invoked = trace.lock();
        // Stopped somewhere inside the first block
        assert!(!invoked.is_empty());
        assert!(invoked.iter().all(|name| name == "g1"));
        assert_eq!(strategy.state(), StrategyState::Stopped);
    }

    #[tokio::test]
    async fn test_gremlin_failure_propagates() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let gremlins = vec![
            TraceCallback::failing("boom", &trace),
            TraceCallback::shared("never", &trace),
        ];

        let strategy = instant(3);
        let err = strategy
            .attack(&gremlins, &RunParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom failed");
        assert_eq!(*trace.lock(), vec!["boom"]);
    }
}
