//! Service injection for callbacks and strategies
//!
//! Gremlins, mogwais, and strategies may opt into receiving the horde-wide
//! logger and randomizer by exposing the [`Inject`] accessors, usually by
//! embedding a [`ServiceSlots`]. Injection runs once per `unleash`, before
//! any phase starts, and only fills slots that are still empty - a caller
//! can pre-configure one service on one gremlin and still receive the
//! horde-wide value for the other.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::HordeError;
use crate::services::{SharedLogger, SharedRandomizer};

/// Optional service accessors a callback or strategy may expose
///
/// The defaults decline injection entirely; implementors that want
/// services override the getter/setter pairs, typically by delegating to
/// an embedded [`ServiceSlots`].
pub trait Inject: Send + Sync {
    fn logger(&self) -> Option<SharedLogger> {
        None
    }

    fn set_logger(&self, _logger: SharedLogger) {}

    fn randomizer(&self) -> Option<SharedRandomizer> {
        None
    }

    fn set_randomizer(&self, _randomizer: SharedRandomizer) {}
}

#[derive(Default)]
struct SlotsInner {
    logger: RwLock<Option<SharedLogger>>,
    randomizer: RwLock<Option<SharedRandomizer>>,
}

/// Pair of optional service slots
///
/// Cheaply clonable; clones share the same slots, so a callback can hand a
/// copy to a spawned future and still observe later injection.
#[derive(Default, Clone)]
pub struct ServiceSlots {
    inner: Arc<SlotsInner>,
}

impl ServiceSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger(&self) -> Option<SharedLogger> {
        self.inner.logger.read().clone()
    }

    pub fn set_logger(&self, logger: SharedLogger) {
        *self.inner.logger.write() = Some(logger);
    }

    pub fn randomizer(&self) -> Option<SharedRandomizer> {
        self.inner.randomizer.read().clone()
    }

    pub fn set_randomizer(&self, randomizer: SharedRandomizer) {
        *self.inner.randomizer.write() = Some(randomizer);
    }

    /// Logger slot, or a missing-service error naming the callback
    pub fn require_logger(&self, callback: &str) -> Result<SharedLogger, HordeError> {
        self.logger()
            .ok_or_else(|| HordeError::missing_service("logger", callback))
    }

    /// Randomizer slot, or a missing-service error naming the callback
    pub fn require_randomizer(&self, callback: &str) -> Result<SharedRandomizer, HordeError> {
        self.randomizer()
            .ok_or_else(|| HordeError::missing_service("randomizer", callback))
    }
}

impl Inject for ServiceSlots {
    fn logger(&self) -> Option<SharedLogger> {
        ServiceSlots::logger(self)
    }

    fn set_logger(&self, logger: SharedLogger) {
        ServiceSlots::set_logger(self, logger)
    }

    fn randomizer(&self) -> Option<SharedRandomizer> {
        ServiceSlots::randomizer(self)
    }

    fn set_randomizer(&self, randomizer: SharedRandomizer) {
        ServiceSlots::set_randomizer(self, randomizer)
    }
}

/// One-shot injector holding the horde-wide services
pub struct ServiceInjector {
    logger: SharedLogger,
    randomizer: SharedRandomizer,
}

impl ServiceInjector {
    pub fn new(logger: SharedLogger, randomizer: SharedRandomizer) -> Self {
        Self { logger, randomizer }
    }

    /// Fill every slot the target exposes and has not already configured
    ///
    /// Idempotent: a slot reporting `Some` is never overwritten, so
    /// injecting the same target twice never touches its setters again.
    pub fn inject(&self, target: &dyn Inject) {
        if target.logger().is_none() {
            target.set_logger(Arc::clone(&self.logger));
        }
        if target.randomizer().is_none() {
            target.set_randomizer(Arc::clone(&self.randomizer));
        }
    }
}
