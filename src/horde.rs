//! Horde controller - registries, injection, and the three-phase pipeline
//!
//! A horde owns the gremlin/mogwai/strategy registries, the before/after
//! callbacks, and the two injected services. One horde corresponds to one
//! logical test configuration and can be unleashed several times;
//! overlapping `unleash` calls on the same horde are unsupported (logged,
//! not prevented).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::callback::SharedCallback;
use crate::catalog::Catalog;
use crate::error::HordeError;
use crate::inject::ServiceInjector;
use crate::sequencer::run_sequence;
use crate::services::{ChaChaRandomizer, SharedLogger, SharedRandomizer, TracingLogger};
use crate::strategies::{Distribution, RunParams, Strategy};

/// Shared handle to a strategy
pub type SharedStrategy = Arc<dyn Strategy>;

/// The monkey-testing controller
pub struct Horde {
    catalog: Catalog,
    gremlins: RwLock<Vec<SharedCallback>>,
    mogwais: RwLock<Vec<SharedCallback>>,
    strategies: RwLock<Vec<SharedStrategy>>,
    before: RwLock<Vec<SharedCallback>>,
    after: RwLock<Vec<SharedCallback>>,
    logger: RwLock<SharedLogger>,
    randomizer: RwLock<SharedRandomizer>,
    running: AtomicBool,
}

impl Horde {
    /// Horde with an empty catalog and default services
    pub fn new() -> Self {
        Self::with_catalog(Catalog::new())
    }

    /// Horde drawing registry defaults from the given catalog
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            gremlins: RwLock::new(Vec::new()),
            mogwais: RwLock::new(Vec::new()),
            strategies: RwLock::new(Vec::new()),
            before: RwLock::new(Vec::new()),
            after: RwLock::new(Vec::new()),
            logger: RwLock::new(Arc::new(TracingLogger)),
            randomizer: RwLock::new(Arc::new(ChaChaRandomizer::new())),
            running: AtomicBool::new(false),
        }
    }

    /// Register a gremlin, chained
    pub fn gremlin(&self, gremlin: SharedCallback) -> &Self {
        self.gremlins.write().push(gremlin);
        self
    }

    /// Register a mogwai, chained
    pub fn mogwai(&self, mogwai: SharedCallback) -> &Self {
        self.mogwais.write().push(mogwai);
        self
    }

    /// Register a strategy, chained
    pub fn strategy(&self, strategy: SharedStrategy) -> &Self {
        self.strategies.write().push(strategy);
        self
    }

    /// Register a callback to run before the attack, chained
    pub fn before(&self, callback: SharedCallback) -> &Self {
        self.before.write().push(callback);
        self
    }

    /// Register a callback to run after the attack, chained
    pub fn after(&self, callback: SharedCallback) -> &Self {
        self.after.write().push(callback);
        self
    }

    /// Register every species from the catalog, chained
    pub fn all_gremlins(&self) -> &Self {
        self.gremlins.write().extend(self.catalog.all_species());
        self
    }

    /// Register every mogwai from the catalog, chained
    pub fn all_mogwais(&self) -> &Self {
        self.mogwais.write().extend(self.catalog.all_mogwais());
        self
    }

    pub fn gremlin_count(&self) -> usize {
        self.gremlins.read().len()
    }

    pub fn mogwai_count(&self) -> usize {
        self.mogwais.read().len()
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.read().len()
    }

    /// Current logger service
    pub fn logger(&self) -> SharedLogger {
        self.logger.read().clone()
    }

    /// Replace the logger service, chained
    pub fn set_logger(&self, logger: SharedLogger) -> &Self {
        *self.logger.write() = logger;
        self
    }

    /// Current randomizer service
    pub fn randomizer(&self) -> SharedRandomizer {
        self.randomizer.read().clone()
    }

    /// Replace the randomizer service, chained
    pub fn set_randomizer(&self, randomizer: SharedRandomizer) -> &Self {
        *self.randomizer.write() = randomizer;
        self
    }

    /// Replace the randomizer with a freshly seeded one, for reproducible
    /// runs, chained
    pub fn seed(&self, seed: u64) -> &Self {
        self.set_randomizer(Arc::new(ChaChaRandomizer::seeded(seed)))
    }

    /// Pass-through to the current logger
    pub fn log(&self, msg: &str) {
        self.logger.read().log(msg);
    }

    /// Whether an `unleash` call is currently in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Forward a cooperative stop to every registered strategy
    ///
    /// A strategy that is not currently running ignores the call, so
    /// stopping before a run starts or after it finished is a no-op.
    pub fn stop(&self) {
        let strategies = self.strategies.read().clone();
        for strategy in strategies {
            strategy.stop();
        }
    }

    /// Run the full pipeline: setup, attack, teardown
    ///
    /// Empty registries are populated lazily: all catalog species, all
    /// catalog mogwais, and a single [`Distribution`] strategy. Services
    /// are injected before any phase starts; a callback that still lacks
    /// a required service fails at its first execution, not here.
    ///
    /// A failing callback aborts the run mid-phase and its error
    /// propagates unchanged; later phases do not execute.
    #[instrument(skip(self, params))]
    pub async fn unleash(&self, params: RunParams) -> Result<(), HordeError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("overlapping unleash on one horde is unsupported");
        }
        let result = self.run(params).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, params: RunParams) -> Result<(), HordeError> {
        let run_id = Uuid::new_v4();

        // Lazy defaults, persisted on the registries like any manual
        // registration would be
        if self.gremlins.read().is_empty() {
            self.all_gremlins();
        }
        if self.mogwais.read().is_empty() {
            self.all_mogwais();
        }
        if self.strategies.read().is_empty() {
            self.strategy(Arc::new(Distribution::default()));
        }

        let gremlins = self.gremlins.read().clone();
        let mogwais = self.mogwais.read().clone();
        let strategies = self.strategies.read().clone();
        let before = self.before.read().clone();
        let after = self.after.read().clone();

        info!(
            %run_id,
            gremlins = gremlins.len(),
            mogwais = mogwais.len(),
            strategies = strategies.len(),
            "unleashing horde"
        );

        let injector = ServiceInjector::new(self.logger(), self.randomizer());
        for callback in gremlins
            .iter()
            .chain(&mogwais)
            .chain(&before)
            .chain(&after)
        {
            injector.inject(callback.as_ref());
        }
        for strategy in &strategies {
            injector.inject(strategy.as_ref());
        }

        // Setup: before-callbacks, then every mogwai once so probes can
        // install their monitoring side effects ahead of the attack
        let mut setup = before;
        setup.extend(mogwais.iter().cloned());
        run_sequence("setup", &setup).await?;

        // Attack: every strategy in registration order, each over its own
        // snapshot of the gremlin registry
        for strategy in &strategies {
            debug!(%run_id, strategy = strategy.name(), "running strategy");
            strategy.attack(&gremlins, &params).await?;
        }

        // Teardown: explicit after-callbacks first, then the cleanups
        // collected from gremlins and mogwais in registration order
        let mut teardown = after;
        teardown.extend(
            gremlins
                .iter()
                .chain(&mogwais)
                .filter_map(|callback| callback.clean_up()),
        );
        run_sequence("teardown", &teardown).await?;

        info!(%run_id, "horde done");
        Ok(())
    }
}

impl Default for Horde {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{FnCallback, TraceCallback};
    use crate::services::Logger;
    use crate::strategies::{AllTogether, AllTogetherConfig};
    use parking_lot::Mutex;
    use std::time::Duration;

    fn trace() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn instant_strategy(waves: u64) -> SharedStrategy {
        Arc::new(AllTogether::new(AllTogetherConfig {
            waves,
            delay: Duration::ZERO,
        }))
    }

    struct CollectingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl CollectingLogger {
        fn new() -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
            }
        }
    }

    impl Logger for CollectingLogger {
        fn log(&self, msg: &str) {
            self.lines.lock().push(msg.to_string());
        }

        fn info(&self, msg: &str) {
            self.log(msg)
        }

        fn warn(&self, msg: &str) {
            self.log(msg)
        }

        fn error(&self, msg: &str) {
            self.log(msg)
        }
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let trace = trace();
        let horde = Horde::new();
        horde
            .before(TraceCallback::shared("before", &trace))
            .mogwai(TraceCallback::shared("mogwai", &trace))
            .gremlin(TraceCallback::shared("gremlin", &trace))
            .after(TraceCallback::shared("after", &trace))
            .strategy(instant_strategy(1));

        horde.unleash(RunParams::default()).await.unwrap();

        assert_eq!(
            *trace.lock(),
            vec!["before", "mogwai", "gremlin", "after"]
        );
    }

    #[tokio::test]
    async fn test_cleanups_run_after_after_callbacks() {
        let trace = trace();
        let gremlin = TraceCallback::new("gremlin", &trace)
            .with_clean_up(TraceCallback::shared("gremlin-cleanup", &trace));
        let mogwai = TraceCallback::new("mogwai", &trace)
            .with_clean_up(TraceCallback::shared("mogwai-cleanup", &trace));

        let horde = Horde::new();
        horde
            .gremlin(gremlin)
            .mogwai(mogwai)
            .after(TraceCallback::shared("after", &trace))
            .strategy(instant_strategy(1));

        horde.unleash(RunParams::default()).await.unwrap();

        assert_eq!(
            *trace.lock(),
            vec![
                "mogwai",
                "gremlin",
                "after",
                "gremlin-cleanup",
                "mogwai-cleanup"
            ]
        );
    }

    #[tokio::test]
    async fn test_cleanups_run_once_per_run() {
        let trace = trace();
        let gremlin = TraceCallback::new("gremlin", &trace)
            .with_clean_up(TraceCallback::shared("cleanup", &trace));

        let horde = Horde::new();
        horde.gremlin(gremlin).strategy(instant_strategy(1));

        horde.unleash(RunParams::default()).await.unwrap();
        horde.unleash(RunParams::default()).await.unwrap();

        let cleanups = trace
            .lock()
            .iter()
            .filter(|name| *name == "cleanup")
            .count();
        assert_eq!(cleanups, 2);
    }

    #[tokio::test]
    async fn test_empty_registries_fall_back_to_catalog() {
        let trace = trace();
        let mut catalog = Catalog::new();
        catalog
            .species(TraceCallback::shared("clicker", &trace))
            .species(TraceCallback::shared("typer", &trace))
            .mogwai(TraceCallback::shared("fps", &trace));

        let horde = Horde::with_catalog(catalog);
        horde.unleash(RunParams::with_nb(3)).await.unwrap();

        assert_eq!(horde.gremlin_count(), 2);
        assert_eq!(horde.mogwai_count(), 1);
        // Single default distribution strategy
        assert_eq!(horde.strategy_count(), 1);
        // The mogwai ran once during setup
        assert_eq!(trace.lock().iter().filter(|n| *n == "fps").count(), 1);
        // Three distribution steps over the two species
        assert_eq!(trace.lock().len(), 1 + 3);
    }

    #[tokio::test]
    async fn test_manual_gremlin_disables_auto_population() {
        let trace = trace();
        let mut catalog = Catalog::new();
        catalog.species(TraceCallback::shared("catalog-only", &trace));

        let horde = Horde::with_catalog(catalog);
        horde
            .gremlin(TraceCallback::shared("manual", &trace))
            .strategy(instant_strategy(1));

        horde.unleash(RunParams::default()).await.unwrap();

        assert_eq!(horde.gremlin_count(), 1);
        assert_eq!(*trace.lock(), vec!["manual"]);
    }

    #[tokio::test]
    async fn test_services_are_injected_into_callbacks() {
        let horde = Horde::new();
        let gremlin = FnCallback::new("needs-services", |services| {
            services.require_logger("needs-services")?;
            services.require_randomizer("needs-services")?;
            Ok(())
        })
        .shared();

        horde.gremlin(gremlin).strategy(instant_strategy(1));
        horde.unleash(RunParams::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_preconfigured_gremlin_service_survives_unleash() {
        let horde = Horde::new();
        let custom: SharedRandomizer = Arc::new(ChaChaRandomizer::seeded(123));

        let gremlin = FnCallback::new("custom-random", |_| Ok(()));
        crate::inject::Inject::set_randomizer(&gremlin, Arc::clone(&custom));
        let gremlin: SharedCallback = Arc::new(gremlin);

        horde.gremlin(Arc::clone(&gremlin)).strategy(instant_strategy(1));
        horde.unleash(RunParams::default()).await.unwrap();

        let slot = crate::inject::Inject::randomizer(gremlin.as_ref()).unwrap();
        assert!(Arc::ptr_eq(&slot, &custom));
    }

    #[tokio::test]
    async fn test_seeded_hordes_pick_identically() {
        let picks = |seed: u64| async move {
            let trace = trace();
            let horde = Horde::new();
            horde
                .gremlin(TraceCallback::shared("a", &trace))
                .gremlin(TraceCallback::shared("b", &trace))
                .gremlin(TraceCallback::shared("c", &trace))
                .strategy(Arc::new(crate::strategies::Distribution::new(
                    crate::strategies::DistributionConfig {
                        steps: 20,
                        delay: Duration::ZERO,
                        weights: None,
                    },
                )))
                .seed(seed);

            horde.unleash(RunParams::default()).await.unwrap();
            let picks = trace.lock().clone();
            picks
        };

        assert_eq!(picks(9).await, picks(9).await);
    }

    #[tokio::test]
    async fn test_stop_halts_a_running_unleash() {
        let trace = trace();
        let horde = Arc::new(Horde::new());
        horde
            .gremlin(TraceCallback::shared("g", &trace))
            .strategy(Arc::new(AllTogether::new(AllTogetherConfig {
                waves: 100_000,
                delay: Duration::from_millis(2),
            })));

        let running = Arc::clone(&horde);
        let handle = tokio::spawn(async move { running.unleash(RunParams::default()).await });

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(horde.is_running());
        horde.stop();
        horde.stop();

        handle.await.unwrap().unwrap();
        assert!(!horde.is_running());
        assert!(trace.lock().len() < 100_000);
    }

    #[tokio::test]
    async fn test_stop_before_any_run_is_noop() {
        let horde = Horde::new();
        horde.strategy(instant_strategy(1));
        horde.stop();
        assert!(!horde.is_running());
    }

    #[tokio::test]
    async fn test_failing_gremlin_aborts_run_and_skips_teardown() {
        let trace = trace();
        let horde = Horde::new();
        horde
            .gremlin(TraceCallback::failing("boom", &trace))
            .after(TraceCallback::shared("after", &trace))
            .strategy(instant_strategy(5));

        let err = horde.unleash(RunParams::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom failed");
        // The attack aborted, teardown never ran
        assert_eq!(*trace.lock(), vec!["boom"]);
        assert!(!horde.is_running());
    }

    #[tokio::test]
    async fn test_log_uses_current_logger() {
        let logger = Arc::new(CollectingLogger::new());
        let horde = Horde::new();
        horde.set_logger(logger.clone());

        horde.log("the horde stirs");
        assert_eq!(*logger.lines.lock(), vec!["the horde stirs"]);
    }

    #[test]
    fn test_registration_is_chainable() {
        let trace = trace();
        let horde = Horde::new();
        horde
            .gremlin(TraceCallback::shared("a", &trace))
            .gremlin(TraceCallback::shared("b", &trace))
            .mogwai(TraceCallback::shared("m", &trace));

        assert_eq!(horde.gremlin_count(), 2);
        assert_eq!(horde.mogwai_count(), 1);
    }
}
